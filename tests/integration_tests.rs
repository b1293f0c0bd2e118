//! Integration tests for end-to-end loading.
//!
//! These tests drive the public API the way an interpreter would: tokenize
//! and parse single expressions, then load whole batches of header and
//! script files against a configured registry.

use std::rc::Rc;

use erb_frontend::{
    ast::terms::{CallTarget, CallTerm, Term},
    errors::errors::{ErrorImpl, ErrorKind},
    format_error,
    instructions::{arguments::Arguments, registry::InstructionRegistry},
    lexer::lexer::tokenize,
    loader::{
        loader::ScriptLoader,
        script::{SourceFile, StatementKind},
    },
    parser::parser::{Parser, Terminators},
    registry::{
        config::Config, constants::ConstantTables, context::ParseContext, identifiers::IdentifierRegistry,
    },
};

fn file() -> Rc<String> {
    Rc::new("TEST.ERB".to_string())
}

fn parse(registry: &IdentifierRegistry, source: &str) -> Result<String, ErrorImpl> {
    let tokens = tokenize(source, file(), 1).map_err(|e| e.get_impl().clone())?;
    let mut context = ParseContext::new(file());
    context.enter_label("MAIN");
    let mut parser = Parser::new(tokens, registry, &mut context);
    let term = parser
        .parse_required(Terminators::EOL, false, false)
        .map_err(|e| e.get_impl().clone())?;
    Ok(term.restructure().to_string())
}

#[test]
fn test_parse_expressions_against_csv_constants() {
    let mut constants = ConstantTables::new();
    constants.load_csv("ABL", "0,Technique\n1,Service ; comment\n", file()).unwrap();
    let registry = IdentifierRegistry::new(Config::new(), InstructionRegistry::builtin(), constants);

    assert_eq!(parse(&registry, "1 + 2 * 3 - 4 / 2").unwrap(), "5");
    assert_eq!(parse(&registry, "ABL:0:Service * 2").unwrap(), "(ABL:0:1 * 2)");
    assert_eq!(parse(&registry, "DAY > 3 ? \"late\" # \"early\"").unwrap(), "((DAY > 3) ? \"late\" # \"early\")");
    assert_eq!(parse(&registry, "LOCAL:1").unwrap(), "LOCAL@MAIN:1");
    assert!(matches!(parse(&registry, "ABL:0:Unknown"), Err(ErrorImpl::IdentifierNotFound { .. })));
}

#[test]
fn test_shared_instruction_registry() {
    let first = ScriptLoader::new(Config::new(), ConstantTables::new());
    let second = ScriptLoader::new(Config::new().case_insensitive(true), ConstantTables::new());
    assert!(std::sync::Arc::ptr_eq(first.registry().instructions(), second.registry().instructions()));
}

#[test]
fn test_load_game() {
    let header = SourceFile::new(
        "GAME.ERH",
        "#DIM SAVEDATA gold\n#DIMS CHARADATA title\n#DEFINE START_GOLD 500\n",
    );
    let system = SourceFile::new(
        "SYSTEM.ERB",
        "\
@EVENTFIRST
\tgold = START_GOLD
\tprintformw Starting with {gold} gold
\tcall shop_open(gold / 100)

@SHOP_OPEN(arg)
\tselectcase arg
\t\tcase 0 to 2
\t\t\tprintl A small shop.
\t\tcase is > 2
\t\t\tprintl A large shop.
\tendselect
\ttitle:0 = Shopkeeper
\tfor local, 0, arg
\t\tgold -= local
\tnext
",
    );
    let broken = SourceFile::new("BROKEN.ERB", "@BROKEN\n\tgold = gold +* 2\n");

    let config = Config::new().case_insensitive(true);
    let mut loader = ScriptLoader::new(config, ConstantTables::new());
    let loaded = loader.load_batch(&[header, system, broken]).unwrap();

    assert!(loaded[0].is_ok());
    let script = loaded[1].result.as_ref().unwrap();
    assert_eq!(script.labels.len(), 2);
    assert_eq!(script.labels[1].name, "SHOP_OPEN");
    assert_eq!(script.labels[1].statements.len(), 10);

    let open = &script.labels[1].statements;
    assert!(matches!(
        &open[0].kind,
        StatementKind::Instruction { name: "SELECTCASE", arguments: Arguments::Expression(Some(_)) }
    ));
    assert!(matches!(&open[1].kind, StatementKind::Instruction { name: "CASE", arguments: Arguments::Case(_) }));
    assert!(matches!(&open[6].kind, StatementKind::Assignment { target, .. } if target.name == "TITLE"));
    assert!(matches!(&open[7].kind, StatementKind::Instruction { name: "FOR", arguments: Arguments::ForNext { .. } }));

    let error = loaded[2].result.as_ref().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Syntax);
    assert_eq!(error.get_position().line, 2);

    let report = format_error(error, Some("\tgold = gold +* 2"));
    assert!(report.contains("-> BROKEN.ERB:2"));
}

#[test]
fn test_overloading_builtins() {
    let script = SourceFile::new("A.ERB", "@ABS(ARG)\n#FUNCTION\n\tRETURNF ARG + 100\n@MAIN\n\tDAY = ABS(1)\n");

    let mut strict = ScriptLoader::new(Config::new(), ConstantTables::new());
    let loaded = strict.load_batch(std::slice::from_ref(&script)).unwrap();
    assert_eq!(loaded[0].result.as_ref().unwrap_err().kind(), ErrorKind::DefinitionConflict);

    let config = Config::new().allow_overloading(true).warn_on_overload(true);
    let mut overloading = ScriptLoader::new(config, ConstantTables::new());
    let loaded = overloading.load_batch(&[script]).unwrap();
    assert!(!loaded[0].diagnostics.is_empty());

    let script = loaded[0].result.as_ref().unwrap();
    let call = &script.labels[1].statements[0].kind;
    assert!(matches!(
        call,
        StatementKind::Assignment { value: Term::Call(CallTerm { target: CallTarget::UserFunction, .. }), .. }
    ));
}
