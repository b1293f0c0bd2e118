//! Unit tests for the identifier registry.
//!
//! This module contains tests for:
//! - Case folding of builtin and user names
//! - Resolution order and label scopes
//! - The definition collision matrix
//! - Freezing after loading
//! - CSV keyword tables

use std::rc::Rc;

use crate::{
    ast::terms::VariableTarget,
    errors::{
        diagnostics::Diagnostics,
        errors::{ErrorImpl, ErrorKind, Severity},
    },
    instructions::registry::InstructionRegistry,
    lexer::lexer::tokenize,
    variables::{
        builtins::VariableCode,
        descriptor::{ValueType, VariableDescriptor, VariableFlags, VariableShape},
    },
    Position,
};

use super::{
    config::Config,
    constants::ConstantTables,
    context::ParseContext,
    identifiers::{IdentifierCategory, IdentifierRegistry, RefMethod, Resolution, UserFunction, UserVariable},
};

fn file() -> Rc<String> {
    Rc::new("TEST.ERH".to_string())
}

fn position() -> Position {
    Position::new(file(), 1, 0)
}

fn registry(config: Config) -> IdentifierRegistry {
    IdentifierRegistry::new(config, InstructionRegistry::builtin(), ConstantTables::new())
}

fn int_variable(name: &str) -> UserVariable {
    UserVariable {
        name: name.to_string(),
        descriptor: VariableDescriptor::user(VariableShape::Array1D, ValueType::Integer, VariableFlags::NONE),
        sizes: vec![10],
    }
}

fn function(name: &str) -> UserFunction {
    UserFunction { name: name.to_string(), return_type: ValueType::Integer, parameters: vec![ValueType::Integer] }
}

#[test]
fn test_case_insensitive_instruction_lookup() {
    let registry = registry(Config::new().case_insensitive(true));
    let upper = registry.find_instruction("PRINT").unwrap();
    let lower = registry.find_instruction("print").unwrap();
    assert!(std::ptr::eq(upper, lower));
}

#[test]
fn test_case_sensitive_instruction_lookup() {
    let registry = registry(Config::new());
    assert!(registry.find_instruction("PRINT").is_ok());
    assert!(matches!(registry.find_instruction("print"), Err(ErrorImpl::IdentifierNotFound { .. })));

    let mut context = ParseContext::new(file());
    assert!(registry.resolve("DAY", None, &mut context, None).is_ok());
    assert!(matches!(
        registry.resolve("day", None, &mut context, None),
        Err(ErrorImpl::IdentifierNotFound { .. })
    ));
}

#[test]
fn test_builtin_categories() {
    let registry = registry(Config::new());
    assert_eq!(registry.category("TO"), Some(IdentifierCategory::ReservedWord));
    assert_eq!(registry.category("FLAG"), Some(IdentifierCategory::SystemVariable));
    assert_eq!(registry.category("PRINTL"), Some(IdentifierCategory::SystemInstruction));
    assert_eq!(registry.category("ABS"), Some(IdentifierCategory::SystemMethod));
    assert_eq!(registry.category("UNKNOWN_NAME"), None);
}

#[test]
fn test_private_variable_shadows_global() {
    let mut registry = registry(Config::new().case_insensitive(true));
    let mut diagnostics = Diagnostics::new();
    registry.add_user_variable(int_variable("SCORE"), &position(), &mut diagnostics).unwrap();

    let private = UserVariable {
        descriptor: VariableDescriptor::user(VariableShape::Scalar, ValueType::String, VariableFlags::LOCAL),
        ..int_variable("score")
    };
    registry.add_private_variable("shop", private, &position(), &mut diagnostics).unwrap();

    let mut context = ParseContext::new(file());
    let Resolution::Variable { target, .. } = registry.resolve("SCORE", None, &mut context, None).unwrap() else {
        panic!("expected a variable");
    };
    assert_eq!(target, VariableTarget::Global("SCORE".to_string()));

    context.enter_label("SHOP");
    let Resolution::Variable { target, descriptor, .. } =
        registry.resolve("Score", None, &mut context, None).unwrap()
    else {
        panic!("expected a variable");
    };
    assert!(matches!(target, VariableTarget::Private { .. }));
    assert_eq!(descriptor.value_type(), ValueType::String);

    assert!(matches!(
        registry.resolve("SCORE", Some("X"), &mut context, None),
        Err(ErrorImpl::SubKeyNotAllowed { .. })
    ));
}

#[test]
fn test_local_slots_are_recorded() {
    let registry = registry(Config::new());
    let mut context = ParseContext::new(file());
    context.enter_label("TRAIN");

    registry.resolve("LOCALS", None, &mut context, None).unwrap();
    registry.resolve("ARG", Some("OTHER"), &mut context, None).unwrap();
    assert!(context.local_slots.contains(&(VariableCode::Locals, "TRAIN".to_string())));
    assert!(context.local_slots.contains(&(VariableCode::Arg, "OTHER".to_string())));

    context.leave_label();
    assert!(matches!(registry.resolve("LOCAL", None, &mut context, None), Err(ErrorImpl::InvalidName { .. })));
}

#[test]
fn test_resolve_calls_and_constants() {
    let mut constants = ConstantTables::new();
    constants.insert("ABL", "Technique", 3);
    let mut registry = IdentifierRegistry::new(Config::new(), InstructionRegistry::builtin(), constants);
    registry.add_user_function(function("GET_SCORE"), &position()).unwrap();

    let mut context = ParseContext::new(file());
    assert!(matches!(registry.resolve("GET_SCORE", None, &mut context, None), Ok(Resolution::Call(_))));
    assert!(matches!(registry.resolve("GETTIME", None, &mut context, None), Ok(Resolution::Call(_))));
    assert_eq!(registry.resolve("Technique", None, &mut context, Some("ABL")), Ok(Resolution::Constant(3)));
    assert!(registry.resolve("Technique", None, &mut context, None).is_err());
    assert_eq!(
        registry.resolve("STATIC", None, &mut context, None),
        Err(ErrorImpl::ReservedWordMisuse { word: "STATIC".to_string() })
    );
    // Builtin functions with required arguments cannot be read bare.
    assert!(matches!(
        registry.resolve("ABS", None, &mut context, None),
        Err(ErrorImpl::MissingArguments { .. })
    ));
}

#[test]
fn test_name_character_set() {
    let registry = registry(Config::new());
    let mut diagnostics = Diagnostics::new();

    assert!(registry.check_variable_name("名前_2", &position(), &mut diagnostics).is_ok());
    for name in ["A-B", "A.B", "", "A B"] {
        let error = registry.check_variable_name(name, &position(), &mut diagnostics).unwrap_err();
        assert!(matches!(error.get_impl(), ErrorImpl::InvalidName { .. }), "{}", name);
    }
    let error = registry.check_label_name("1ST", &position(), &mut diagnostics).unwrap_err();
    assert!(matches!(error.get_impl(), ErrorImpl::InvalidName { .. }));
}

#[test]
fn test_reserved_and_instruction_collisions_are_errors() {
    let registry = registry(Config::new().allow_overloading(true));
    let mut diagnostics = Diagnostics::new();

    for name in ["TO", "PRINT", "IF"] {
        let error = registry.check_function_name(name, &position(), &mut diagnostics).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DefinitionConflict, "{}", name);
        assert!(registry.check_variable_name(name, &position(), &mut diagnostics).is_err());
    }
}

#[test]
fn test_system_collisions_depend_on_definition_kind() {
    let mut diagnostics = Diagnostics::new();
    let strict = registry(Config::new());
    assert!(strict.check_variable_name("ABS", &position(), &mut diagnostics).is_err());
    assert!(strict.check_macro_name("FLAG", &position(), &mut diagnostics).is_err());
    assert!(strict.check_function_name("ABS", &position(), &mut diagnostics).is_err());
    assert!(strict.check_label_name("FLAG", &position(), &mut diagnostics).is_err());

    let overloading = registry(Config::new().allow_overloading(true));
    assert!(overloading.check_variable_name("ABS", &position(), &mut diagnostics).is_err());
    assert!(overloading.check_function_name("ABS", &position(), &mut diagnostics).is_ok());
    assert!(overloading.check_label_name("FLAG", &position(), &mut diagnostics).is_ok());
    assert!(diagnostics.is_empty());

    let warning = registry(Config::new().allow_overloading(true).warn_on_overload(true));
    assert!(warning.check_function_name("ABS", &position(), &mut diagnostics).is_ok());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.entries()[0].severity, Severity::Warning);
}

#[test]
fn test_user_collisions() {
    let mut registry = registry(Config::new());
    let mut diagnostics = Diagnostics::new();
    registry.add_user_variable(int_variable("GOLD"), &position(), &mut diagnostics).unwrap();
    registry.add_macro("DOUBLE", tokenize("2 * ", file(), 1).unwrap(), &position(), &mut diagnostics).unwrap();
    registry
        .add_ref_method(RefMethod { name: "HANDLER".to_string(), return_type: ValueType::Integer }, &position(), &mut diagnostics)
        .unwrap();

    let error = registry.add_user_variable(int_variable("GOLD"), &position(), &mut diagnostics).unwrap_err();
    assert_eq!(error.get_impl(), &ErrorImpl::VariableAlreadyDeclared { variable: "GOLD".to_string() });
    assert!(registry.check_macro_name("GOLD", &position(), &mut diagnostics).is_err());
    assert!(registry.check_label_name("GOLD", &position(), &mut diagnostics).is_ok());

    for name in ["DOUBLE", "HANDLER"] {
        let error = registry.check_function_name(name, &position(), &mut diagnostics).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DefinitionConflict);
        assert!(registry.check_variable_name(name, &position(), &mut diagnostics).is_err());
    }
}

#[test]
fn test_private_duplicates() {
    let mut registry = registry(Config::new());
    let mut diagnostics = Diagnostics::new();
    registry.add_private_variable("A", int_variable("X"), &position(), &mut diagnostics).unwrap();
    registry.add_private_variable("B", int_variable("X"), &position(), &mut diagnostics).unwrap();

    let error = registry.add_private_variable("A", int_variable("X"), &position(), &mut diagnostics).unwrap_err();
    assert!(matches!(error.get_impl(), ErrorImpl::VariableAlreadyDeclared { .. }));
    assert!(registry.private("B", "X").is_some());
}

#[test]
fn test_labels_and_functions() {
    let mut registry = registry(Config::new());
    let mut diagnostics = Diagnostics::new();

    assert!(registry.add_label("EVENT_END", &position(), &mut diagnostics).unwrap());
    assert!(!registry.add_label("EVENT_END", &position(), &mut diagnostics).unwrap());
    assert!(registry.has_label("EVENT_END"));

    registry.add_user_function(function("EVENT_END"), &position()).unwrap();
    let error = registry.add_user_function(function("EVENT_END"), &position()).unwrap_err();
    assert!(matches!(error.get_impl(), ErrorImpl::FunctionAlreadyDeclared { .. }));
    assert!(registry.callable("EVENT_END").is_some());
}

#[test]
fn test_frozen_registry_rejects_additions() {
    let mut registry = registry(Config::new());
    let mut diagnostics = Diagnostics::new();
    registry.finish_loading();
    assert!(registry.is_frozen());

    let error = registry.add_user_variable(int_variable("LATE"), &position(), &mut diagnostics).unwrap_err();
    assert!(matches!(error.get_impl(), ErrorImpl::RegistryFrozen { .. }));
    assert_eq!(error.kind(), ErrorKind::InternalInvariant);
    assert!(registry.add_label("LATE", &position(), &mut diagnostics).is_err());
    assert!(registry.global("LATE").is_none());
}

#[test]
fn test_load_csv() {
    let mut constants = ConstantTables::new();
    let source = "0,Stamina\n; comment row\n1,Energy ; trailing comment\n\n2\n3,Lust,extra";
    constants.load_csv("BASE", source, file()).unwrap();

    assert_eq!(constants.lookup("BASE", "Stamina"), Some(0));
    assert_eq!(constants.lookup("BASE", "Energy"), Some(1));
    assert_eq!(constants.lookup("BASE", "Lust"), Some(3));
    assert_eq!(constants.table("BASE").map(|t| t.len()), Some(3));

    let error = constants.load_csv("BASE", "0,A\nx,B", file()).unwrap_err();
    assert!(matches!(error.get_impl(), ErrorImpl::NumberParseError { .. }));
    assert_eq!(error.get_position().line, 2);
}

#[test]
fn test_constants_fold_with_case_insensitivity() {
    let mut constants = ConstantTables::new();
    constants.insert("Abl", "Technique", 3);
    let registry = IdentifierRegistry::new(Config::new().case_insensitive(true), InstructionRegistry::builtin(), constants);
    assert_eq!(registry.constants().lookup("ABL", "TECHNIQUE"), Some(3));

    let mut context = ParseContext::new(file());
    assert_eq!(registry.resolve("technique", None, &mut context, Some("ABL")), Ok(Resolution::Constant(3)));
}
