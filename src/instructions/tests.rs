//! Unit tests for the instruction registry and argument shapes.

use std::{rc::Rc, sync::Arc};

use crate::{
    ast::{operators::OperatorCode, terms::Term},
    errors::{diagnostics::Diagnostics, errors::ErrorImpl},
    registry::{
        config::Config, constants::ConstantTables, context::ParseContext, identifiers::IdentifierRegistry,
    },
    variables::descriptor::ValueType,
    Position,
};

use super::{
    arguments::{parse_instruction_arguments, Arguments, CaseCondition, Color, JumpTarget},
    flags::InstructionFlags,
    functions::{EXPRESSION_FUNCTIONS, EXPRESSION_FUNCTION_TABLE},
    registry::InstructionRegistry,
    shapes::ArgumentShape,
};

fn registry() -> IdentifierRegistry {
    let mut registry =
        IdentifierRegistry::new(Config::new().case_insensitive(true), InstructionRegistry::builtin(), ConstantTables::new());
    let position = Position::new(Rc::new("TEST.ERB".to_string()), 1, 0);
    registry.add_label("SHOP_MAIN", &position, &mut Diagnostics::new()).unwrap();
    registry
}

fn arguments(registry: &IdentifierRegistry, instruction: &str, raw: &str) -> Result<Arguments, ErrorImpl> {
    let descriptor = registry.lookup_instruction(instruction).unwrap();
    let mut context = ParseContext::new(Rc::new("TEST.ERB".to_string()));
    context.line = 1;
    parse_instruction_arguments(descriptor, raw, instruction.len() as u32, registry, &mut context)
        .map_err(|e| e.get_impl().clone())
}

#[test]
fn test_every_block_opener_has_one_closer() {
    let registry = InstructionRegistry::new();

    for name in registry.names() {
        let descriptor = registry.lookup(name).unwrap();
        if descriptor.is_block_start() {
            let end = registry.block_end(name).unwrap();
            assert_eq!(descriptor.block_end, Some(end), "{}", name);
            assert!(registry.lookup(end).is_some(), "closer of {} is not registered", name);
        } else {
            assert!(registry.block_end(name).is_none(), "{}", name);
        }
    }

    for (opener, closer) in registry.block_matches() {
        assert!(registry.lookup(opener).is_some_and(|d| d.is_block_start()), "{}", opener);
        assert!(registry.lookup(closer).is_some(), "{}", closer);
    }
}

#[test]
fn test_block_matches() {
    let registry = InstructionRegistry::new();
    assert_eq!(registry.block_end("IF"), Some("ENDIF"));
    assert_eq!(registry.block_end("SELECTCASE"), Some("ENDSELECT"));
    assert_eq!(registry.block_end("FOR"), Some("NEXT"));
    assert_eq!(registry.block_end("TRYCCALL"), Some("CATCH"));
    assert_eq!(registry.block_end("PRINTDATA"), Some("ENDDATA"));
    assert_eq!(registry.block_end("ENDIF"), None);
}

#[test]
fn test_builtin_registry_is_shared() {
    let first = InstructionRegistry::builtin();
    let second = InstructionRegistry::builtin();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!first.is_empty());
}

#[test]
fn test_functions_become_method_instructions() {
    let registry = InstructionRegistry::new();

    let abs = registry.lookup("ABS").unwrap();
    assert_eq!(abs.shape, ArgumentShape::Method("ABS"));
    assert!(abs.has_flag(InstructionFlags::METHOD_SAFE));

    // An instruction keeps its own name; the function stays callable in expressions.
    let gettime = registry.lookup("GETTIME").unwrap();
    assert_eq!(gettime.shape, ArgumentShape::Void);
    assert!(registry.function("GETTIME").is_some());

    for function in EXPRESSION_FUNCTION_TABLE {
        assert!(registry.lookup(function.name).is_some(), "{}", function.name);
    }
    assert_eq!(EXPRESSION_FUNCTIONS.len(), EXPRESSION_FUNCTION_TABLE.len());
}

#[test]
fn test_instruction_flags() {
    let registry = InstructionRegistry::new();
    let printw = registry.lookup("PRINTW").unwrap();
    assert!(printw.has_flag(InstructionFlags::IS_PRINT | InstructionFlags::NEWLINE | InstructionFlags::WAIT));
    assert!(registry.lookup("TRYCALL").unwrap().has_flag(InstructionFlags::TRY));
    assert!(!registry.lookup("CALL").unwrap().has_flag(InstructionFlags::TRY));
    assert!(registry.lookup("ELSE").unwrap().has_flag(InstructionFlags::PARTIAL));
    assert!(registry.lookup("ASSERT").unwrap().has_flag(InstructionFlags::DEBUG_ONLY));

    let mut flags = InstructionFlags::NONE;
    assert!(flags.is_empty());
    flags |= InstructionFlags::JUMP;
    assert!(flags.contains(InstructionFlags::JUMP));
    assert!(!flags.contains(InstructionFlags::JUMP | InstructionFlags::TRY));
}

#[test]
fn test_raw_and_formatted_arguments() {
    let registry = registry();
    assert_eq!(arguments(&registry, "PRINTL", " Hello,  world").unwrap(), Arguments::RawString("Hello,  world".to_string()));
    assert_eq!(arguments(&registry, "PRINTL", "").unwrap(), Arguments::RawString(String::new()));

    let Arguments::Formatted(formatted) = arguments(&registry, "PRINTFORML", " Day {DAY}").unwrap() else {
        panic!("expected a formatted argument");
    };
    assert_eq!(formatted.parts.len(), 2);
}

#[test]
fn test_expression_arguments() {
    let registry = registry();
    assert!(matches!(arguments(&registry, "IF", " DAY > 3").unwrap(), Arguments::Expression(Some(_))));
    assert!(matches!(arguments(&registry, "IF", " \"a\"").unwrap_err(), ErrorImpl::TypeMatchError { .. }));
    assert_eq!(arguments(&registry, "IF", "").unwrap_err(), ErrorImpl::ExpressionExpected);

    assert!(arguments(&registry, "SELECTCASE", " \"a\"").is_ok());
    assert!(arguments(&registry, "PRINTS", " \"a\" + \"b\"").is_ok());
    assert!(matches!(arguments(&registry, "PRINTS", " 1").unwrap_err(), ErrorImpl::TypeMatchError { .. }));

    assert_eq!(arguments(&registry, "INPUT", "").unwrap(), Arguments::Expression(None));
    assert_eq!(arguments(&registry, "RETURN", " 1, 2").unwrap(), Arguments::Expressions(vec![Some(Term::Integer(1)), Some(Term::Integer(2))]));
}

#[test]
fn test_void_arguments() {
    let registry = registry();
    assert_eq!(arguments(&registry, "ENDIF", "").unwrap(), Arguments::None);
    assert!(matches!(arguments(&registry, "ENDIF", " 1").unwrap_err(), ErrorImpl::UnexpectedToken { .. }));
}

#[test]
fn test_variable_arguments() {
    let registry = registry();
    assert_eq!(arguments(&registry, "PRINTDATA", "").unwrap(), Arguments::Variable(None));
    assert!(matches!(arguments(&registry, "PRINTDATA", " RESULT").unwrap(), Arguments::Variable(Some(_))));
    assert!(matches!(arguments(&registry, "PRINTDATA", " 1 + 1").unwrap_err(), ErrorImpl::NotAVariable { .. }));

    let Arguments::Assignment { target, value, range } = arguments(&registry, "VARSET", " FLAG, 1, 0, 10").unwrap() else {
        panic!("expected an assignment");
    };
    assert_eq!(target.name, "FLAG");
    assert_eq!(value, Some(Term::Integer(1)));
    assert_eq!(range, Some((Term::Integer(0), Term::Integer(10))));

    assert!(matches!(arguments(&registry, "VARSET", " FLAG, \"x\"").unwrap_err(), ErrorImpl::TypeMatchError { .. }));
    assert!(matches!(arguments(&registry, "VARSET", " CHARANUM").unwrap_err(), ErrorImpl::VariableNotWritable { .. }));

    let Arguments::Assignment { target, .. } = arguments(&registry, "VARSET", " TA").unwrap() else {
        panic!("expected an assignment");
    };
    assert!(target.indices.is_empty());
}

#[test]
fn test_bar_and_colour_arguments() {
    let registry = registry();
    assert!(matches!(arguments(&registry, "BAR", " 5, 10, 20").unwrap(), Arguments::Bar { .. }));
    assert!(arguments(&registry, "BAR", " 5, 10").is_err());

    assert!(matches!(arguments(&registry, "SETCOLOR", " 255, 0, 0").unwrap(), Arguments::Color(Color::Rgb(..))));
    assert!(matches!(arguments(&registry, "SETCOLOR", " 0xFF0000").unwrap(), Arguments::Color(Color::Packed(_))));
}

#[test]
fn test_for_arguments() {
    let registry = registry();
    let Arguments::ForNext { counter, step, .. } = arguments(&registry, "FOR", " COUNT, 0, 10").unwrap() else {
        panic!("expected a for loop");
    };
    assert_eq!(counter.name, "COUNT");
    assert_eq!(step, Term::Integer(1));

    let Arguments::ForNext { step, .. } = arguments(&registry, "FOR", " COUNT, 10, 0, -1").unwrap() else {
        panic!("expected a for loop");
    };
    assert_eq!(step.restructure(), Term::Integer(-1));

    assert!(matches!(arguments(&registry, "FOR", " STR, 0, 10").unwrap_err(), ErrorImpl::TypeMatchError { .. }));
}

#[test]
fn test_save_variable_arguments() {
    let registry = registry();
    let Arguments::SaveVariables { targets, .. } =
        arguments(&registry, "SAVEVAR", " \"slot\", \"memo\", FLAG, STR").unwrap()
    else {
        panic!("expected save arguments");
    };
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].name, "FLAG");
    assert!(targets[0].indices.is_empty());
    assert_eq!(targets[1].descriptor.value_type(), ValueType::String);

    let rejected = [" \"slot\", \"memo\", 1 + 2", " \"slot\", \"memo\", FLAG, \"text\""];
    for raw in rejected {
        assert!(matches!(arguments(&registry, "SAVEVAR", raw).unwrap_err(), ErrorImpl::NotAVariable { .. }));
    }
}

#[test]
fn test_call_arguments() {
    let registry = registry();
    let Arguments::Call { target, arguments: args } = arguments(&registry, "CALL", " shop_main, 1, DAY").unwrap() else {
        panic!("expected a call");
    };
    assert_eq!(target, JumpTarget::Static("SHOP_MAIN".to_string()));
    assert_eq!(args.len(), 2);

    assert!(arguments(&registry, "CALL", " SHOP_MAIN(1)").is_ok());
    assert!(matches!(arguments(&registry, "CALL", " NOWHERE").unwrap_err(), ErrorImpl::IdentifierNotFound { .. }));
    assert!(arguments(&registry, "TRYCALL", " NOWHERE").is_ok());
}

#[test]
fn test_call_form_arguments() {
    let registry = registry();
    let Arguments::Call { target, arguments: args } =
        arguments(&registry, "CALLFORM", " SHOP_{DAY}, 1").unwrap()
    else {
        panic!("expected a call");
    };
    assert!(matches!(target, JumpTarget::Dynamic(_)));
    assert_eq!(args, vec![Some(Term::Integer(1))]);

    let Arguments::Call { target, .. } = arguments(&registry, "CALLFORM", " SHOP_%\"MAIN\"%(2)").unwrap() else {
        panic!("expected a call");
    };
    assert_eq!(target, JumpTarget::Static("SHOP_MAIN".to_string()));

    assert!(matches!(arguments(&registry, "CALLFORM", " NOWHERE").unwrap_err(), ErrorImpl::IdentifierNotFound { .. }));
}

#[test]
fn test_case_arguments() {
    let registry = registry();
    let Arguments::Case(conditions) = arguments(&registry, "CASE", " 1, 3 TO 5, IS >= 10").unwrap() else {
        panic!("expected case conditions");
    };
    assert_eq!(conditions.len(), 3);
    assert_eq!(conditions[0], CaseCondition::Value(Term::Integer(1)));
    assert_eq!(conditions[1], CaseCondition::Range(Term::Integer(3), Term::Integer(5)));
    assert_eq!(conditions[2], CaseCondition::Is(OperatorCode::GreaterEqual, Term::Integer(10)));

    assert!(arguments(&registry, "CASE", " IS + 1").is_err());
    assert!(matches!(arguments(&registry, "CASE", " 1 TO \"a\"").unwrap_err(), ErrorImpl::TypeMatchError { .. }));
}

#[test]
fn test_method_arguments() {
    let registry = registry();
    assert!(matches!(arguments(&registry, "ABS", " -3").unwrap(), Arguments::Method { name: "ABS", .. }));
    assert!(matches!(arguments(&registry, "ABS", " 1, 2").unwrap_err(), ErrorImpl::UnexpectedArguments { .. }));
}
