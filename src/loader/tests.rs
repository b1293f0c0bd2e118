//! Unit tests for batch loading.
//!
//! This module contains tests for:
//! - Header declarations and macros
//! - Label signatures and user functions
//! - Statement parsing (instructions, assignments, increments)
//! - Per-file error isolation

use crate::{
    ast::{operators::OperatorCode, terms::Term},
    errors::errors::{ErrorImpl, ErrorKind, Severity},
    instructions::arguments::Arguments,
    registry::{config::Config, constants::ConstantTables},
    variables::{builtins::VariableCode, descriptor::ValueType},
};

use super::{
    loader::ScriptLoader,
    script::{LoadedFile, ScriptFile, SourceFile, StatementKind},
};

fn sources(files: &[(&str, &str)]) -> Vec<SourceFile> {
    files.iter().map(|(name, text)| SourceFile::new(*name, *text)).collect()
}

fn load(config: Config, files: &[(&str, &str)]) -> (ScriptLoader, Vec<LoadedFile>) {
    let mut loader = ScriptLoader::new(config, ConstantTables::new());
    let loaded = loader.load_batch(&sources(files)).unwrap();
    (loader, loaded)
}

fn loaded_script(loaded: &LoadedFile) -> &ScriptFile {
    match &loaded.result {
        Ok(script) => script,
        Err(error) => panic!("{} failed: {:?} at {}", loaded.name, error.get_impl(), error.get_position()),
    }
}

fn load_error(config: Config, files: &[(&str, &str)]) -> ErrorImpl {
    let (_, loaded) = load(config, files);
    let failed: Vec<_> = loaded.iter().filter(|file| !file.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    failed[0].result.as_ref().unwrap_err().get_impl().clone()
}

const HEADER: &str = "\
; shared declarations
#DIM SAVEDATA GOLD
#DIMS GREETING
#DIM GRID, 10, 20
#DEFINE DOUBLE_GOLD (GOLD * 2)
#FUNCTION REF HANDLER
";

const SCRIPT: &str = "\
@SYSTEM_TITLE
\t#DIM BONUS, 5
\tPRINTL Welcome
\tGOLD = DOUBLE_GOLD + 1
\tGREETING = Hello %NAME:0%
\tGRID:1:2 += 3
\tGOLD++
\tIF GOLD > 10
\t\tCALL SHOP(GOLD)
\tENDIF
\tBONUS:1 = GET_BONUS(2)

@SHOP(ARG)
\tPRINTFORML {ARG} gold

@GET_BONUS(ARG)
#FUNCTION
\tRETURNF ARG * 2
";

#[test]
fn test_load_batch() {
    let (loader, loaded) = load(Config::new(), &[("GAME.ERH", HEADER), ("TITLE.ERB", SCRIPT)]);
    assert_eq!(loaded.len(), 2);
    assert!(loaded_script(&loaded[0]).labels.is_empty());

    let script = loaded_script(&loaded[1]);
    let names: Vec<_> = script.labels.iter().map(|label| label.name.as_str()).collect();
    assert_eq!(names, ["SYSTEM_TITLE", "SHOP", "GET_BONUS"]);

    let title = &script.labels[0];
    assert_eq!(title.statements.len(), 9);
    assert_eq!(title.statements[0].position.line, 3);
    assert_eq!(title.statements[0].position.column, 1);
    assert!(matches!(
        &title.statements[0].kind,
        StatementKind::Instruction { name: "PRINTL", arguments: Arguments::RawString(text) } if text == "Welcome"
    ));

    let StatementKind::Assignment { target, operator: None, value } = &title.statements[1].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(target.name, "GOLD");
    assert_eq!(value.to_string(), "((GOLD * 2) + 1)");

    let StatementKind::Assignment { value, .. } = &title.statements[2].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(value.result_type(), ValueType::String);

    assert!(matches!(&title.statements[3].kind, StatementKind::Assignment { operator: Some(_), .. }));
    assert!(matches!(&title.statements[4].kind, StatementKind::Increment(term) if term.to_string() == "(GOLD++)"));
    assert!(matches!(&title.statements[6].kind, StatementKind::Instruction { name: "CALL", .. }));

    let StatementKind::Assignment { target, value, .. } = &title.statements[8].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(target.name, "BONUS");
    assert_eq!(value.to_string(), "GET_BONUS(2)");

    let bonus = &script.labels[2];
    assert_eq!(bonus.function, Some(ValueType::Integer));
    assert_eq!(bonus.parameters.len(), 1);

    let registry = loader.registry();
    assert!(registry.is_frozen());
    assert!(registry.global("GOLD").is_some_and(|v| v.descriptor.is_save_data()));
    assert_eq!(registry.global("GRID").map(|v| v.sizes.clone()), Some(vec![10, 20]));
    assert!(registry.private("SYSTEM_TITLE", "BONUS").is_some());
    assert!(registry.callable("HANDLER").is_some());
    assert_eq!(registry.user_function("GET_BONUS").map(|f| f.parameters.clone()), Some(vec![ValueType::Integer]));
}

#[test]
fn test_malformed_file_is_isolated() {
    let files = [
        ("A.ERB", "@FIRST\n\tFLAG:0 = 1\n"),
        ("B.ERB", "@SECOND\n\tFLAG:0 = 1\n\tFLAG:1 = (2 + 3\n\tFLAG:2 = 4\n"),
        ("C.ERB", "@THIRD\n\tFLAG:0 = 1 + FIRST_RESULT\n"),
        ("D.ERB", "@FOURTH\n\tCALL SECOND\n"),
    ];
    let (_, loaded) = load(Config::new(), &files[..2]);
    assert!(loaded[0].is_ok());
    assert!(!loaded[1].is_ok());

    let (_, loaded) = load(Config::new(), &files);
    let failed: Vec<_> = loaded.iter().filter(|file| !file.is_ok()).map(|file| file.name.as_str()).collect();
    assert_eq!(failed, ["B.ERB", "C.ERB"]);

    let error = loaded[1].result.as_ref().unwrap_err();
    assert_eq!(error.get_position().line, 3);
    assert!(error.is_syntax_error());
    assert_eq!(loaded[2].result.as_ref().unwrap_err().kind(), ErrorKind::IdentifierNotFound);
    // Labels of a file with a body error are still known to the others.
    assert!(loaded[3].is_ok());
}

#[test]
fn test_internal_invariant_aborts_batch() {
    let (mut loader, loaded) = load(Config::new(), &[("A.ERB", "@FIRST\n")]);
    assert!(loaded[0].is_ok());

    let error = loader.load_batch(&sources(&[("B.ERB", "@LATE\n")])).unwrap_err();
    assert!(matches!(error.get_impl(), ErrorImpl::RegistryFrozen { .. }));
    assert!(error.is_fatal_for_process());
}

#[test]
fn test_duplicate_labels() {
    let files = [
        ("A.ERB", "@MENU\n\tPRINTL one\n"),
        ("B.ERB", "@MENU\n\tPRINTL two\n\tUNDEFINED_NAME = 1\n@OTHER\n\tPRINTL three\n"),
    ];

    let (_, loaded) = load(Config::new().warn_on_function_duplicate(true), &files);
    let second = loaded_script(&loaded[1]);
    assert_eq!(second.labels.len(), 1);
    assert_eq!(second.labels[0].name, "OTHER");
    assert_eq!(loaded[1].diagnostics.len(), 1);
    assert_eq!(loaded[1].diagnostics[0].severity, Severity::Warning);

    let (_, loaded) = load(Config::new(), &files);
    assert!(loaded[1].is_ok());
    assert!(loaded[1].diagnostics.is_empty());
}

#[test]
fn test_event_labels_keep_every_definition() {
    let files = [
        ("A.ERB", "@EVENTFIRST\n\tDAY = 1\n@EVENTFIRST\n\tMONEY = 2\n"),
        ("B.ERB", "@EVENTFIRST\n\tTIME = 3\n"),
    ];

    let (_, loaded) = load(Config::new().warn_on_function_duplicate(true), &files);
    let first = loaded_script(&loaded[0]);
    assert_eq!(first.labels.len(), 2);
    assert!(first.labels.iter().all(|label| label.name == "EVENTFIRST" && label.statements.len() == 1));
    assert!(matches!(
        &first.labels[1].statements[0].kind,
        StatementKind::Assignment { target, .. } if target.name == "MONEY"
    ));
    assert_eq!(loaded_script(&loaded[1]).labels.len(), 1);
    assert!(loaded.iter().all(|file| file.diagnostics.is_empty()));
}

#[test]
fn test_instruction_case_folding() {
    let files = [("A.ERB", "@MAIN\n\tprint Hello\n")];

    let (_, loaded) = load(Config::new().case_insensitive(true), &files);
    let script = loaded_script(&loaded[0]);
    assert!(matches!(&script.labels[0].statements[0].kind, StatementKind::Instruction { name: "PRINT", .. }));

    let error = load_error(Config::new(), &files);
    assert!(matches!(error, ErrorImpl::IdentifierNotFound { .. }));
}

#[test]
fn test_header_errors() {
    let cases = [
        ("#DIM PRINT", "DefinitionConflict"),
        ("#DIM COUNTS, 0", "UnexpectedTokenDetailed"),
        ("#DIM CUBE, 1, 2, 3, 4", "TooManyIndices"),
        ("#DIMS 2ND", "UnexpectedToken"),
        ("#FUNCTION HANDLER", "UnexpectedTokenDetailed"),
        ("#DEFINE", "UnexpectedEndOfLine"),
        ("#INCLUDE OTHER.ERH", "UnexpectedTokenDetailed"),
        ("PRINTL hello", "UnexpectedTokenDetailed"),
    ];

    for (line, expected) in cases {
        let (_, loaded) = load(Config::new(), &[("BAD.ERH", line)]);
        let error = loaded[0].result.as_ref().unwrap_err();
        assert_eq!(error.get_error_name(), expected, "{}", line);
    }
}

#[test]
fn test_global_and_macro_conflicts() {
    let error = load_error(Config::new(), &[("A.ERH", "#DIM GOLD\n#DIMS GOLD\n")]);
    assert_eq!(error, ErrorImpl::VariableAlreadyDeclared { variable: "GOLD".to_string() });

    let error = load_error(Config::new(), &[("A.ERH", "#DEFINE TWICE 2\n#FUNCTION REF TWICE\n")]);
    assert!(matches!(error, ErrorImpl::DefinitionConflict { .. }));
}

#[test]
fn test_macro_expansion() {
    let header = "#DEFINE LIMIT 100\n#DEFINE HALF_LIMIT LIMIT / 2\n#DEFINE LABEL_TEXT \"LIMIT\"\n";
    let script = "@MAIN\n\tFLAG:0 = HALF_LIMIT\n\tSTR:0 '= LABEL_TEXT\n\tPRINTL LIMIT\n";
    let (_, loaded) = load(Config::new(), &[("A.ERH", header), ("A.ERB", script)]);

    let statements = &loaded_script(&loaded[1]).labels[0].statements;
    let StatementKind::Assignment { value, .. } = &statements[0].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(value.as_integer(), Some(50));
    let StatementKind::Assignment { value, .. } = &statements[1].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(value.to_string(), "\"LIMIT\"");
    // Raw text is never expanded.
    assert!(matches!(
        &statements[2].kind,
        StatementKind::Instruction { arguments: Arguments::RawString(text), .. } if text == "LIMIT"
    ));
}

#[test]
fn test_recursive_macros() {
    let header = "#DEFINE PING PONG\n#DEFINE PONG PING\n";
    let error = load_error(Config::new(), &[("A.ERH", header), ("A.ERB", "@MAIN\n\tFLAG:0 = PING\n")]);
    assert!(matches!(error, ErrorImpl::UnexpectedTokenDetailed { .. }));
}

#[test]
fn test_assignments() {
    let script = "\
@MAIN
\tSTR:0 '= \"a\" + \"b\"
\tSTR:1 = plain text
\tSTR:2 += \"x\"
\tDAY *= 2
\t--DAY
";
    let (_, loaded) = load(Config::new(), &[("A.ERB", script)]);
    let statements = &loaded_script(&loaded[0]).labels[0].statements;
    assert_eq!(statements.len(), 5);

    let StatementKind::Assignment { value, .. } = &statements[0].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(value.to_string(), "\"ab\"");
    let StatementKind::Assignment { value, .. } = &statements[1].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(value.to_string(), "\"plain text\"");
    assert!(matches!(&statements[4].kind, StatementKind::Increment(_)));

    let failures = [
        ("FLAG:0 = \"x\"", "TypeMatchError"),
        ("FLAG:0 '= \"x\"", "TypeMatchError"),
        ("FLAG:0 -= \"x\"", "OperandTypeMismatch"),
        ("CHARANUM = 1", "VariableNotWritable"),
        ("1 = 2", "NotAVariable"),
        ("FLAG:0 + 1", "UnexpectedTokenDetailed"),
    ];
    for (line, expected) in failures {
        let (_, loaded) = load(Config::new(), &[("A.ERB", &format!("@MAIN\n\t{}\n", line))]);
        let error = loaded[0].result.as_ref().unwrap_err();
        assert_eq!(error.get_error_name(), expected, "{}", line);
    }
}

#[test]
fn test_oversized_string_repetition_loads_unfolded() {
    let files = [
        ("A.ERB", "@MAIN\n\tSTR:0 '= \"ab\" * 4611686018427387904\n"),
        ("B.ERB", "@OTHER\n\tDAY = 1\n"),
    ];
    let (_, loaded) = load(Config::new(), &files);

    let statements = &loaded_script(&loaded[0]).labels[0].statements;
    assert!(matches!(
        &statements[0].kind,
        StatementKind::Assignment { value: Term::Binary { operator: OperatorCode::Mult, .. }, .. }
    ));
    assert!(loaded[1].is_ok());
}

#[test]
fn test_statement_outside_label() {
    let error = load_error(Config::new(), &[("A.ERB", "PRINTL early\n@MAIN\n")]);
    assert!(matches!(error, ErrorImpl::UnexpectedTokenDetailed { .. }));

    let error = load_error(Config::new(), &[("A.ERB", "#DIM EARLY\n@MAIN\n")]);
    assert!(matches!(error, ErrorImpl::UnexpectedTokenDetailed { .. }));
}

#[test]
fn test_function_signatures() {
    let script = "\
@DESCRIBE(ARG, ARGS = \"a\")
#FUNCTIONS
\tLOCALS = %ARGS% {ARG}
@MAIN
\tSTR:0 '= DESCRIBE(1, \"b\")
\tLOCAL = 1
";
    let (loader, loaded) = load(Config::new(), &[("A.ERB", script)]);
    let script = loaded_script(&loaded[0]);
    assert!(script.local_slots.contains(&(VariableCode::Locals, "DESCRIBE".to_string())));
    assert!(script.local_slots.contains(&(VariableCode::Local, "MAIN".to_string())));

    let function = loader.registry().user_function("DESCRIBE").unwrap();
    assert_eq!(function.return_type, ValueType::String);
    assert_eq!(function.parameters, [ValueType::Integer, ValueType::String]);

    let error = load_error(Config::new(), &[("A.ERB", "@F(ARG)\n#FUNCTION\n@MAIN\n\tFLAG:0 = F(\"b\")\n")]);
    assert!(matches!(error, ErrorImpl::ArgumentTypeMatchError { .. }));
}
