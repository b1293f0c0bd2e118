//! Unit tests for error handling.
//!
//! This module contains tests for error classification and diagnostics.

use crate::errors::diagnostics::Diagnostics;
use crate::errors::errors::{Error, ErrorImpl, ErrorKind, ErrorTip, Severity};
use crate::Position;
use std::rc::Rc;

fn position() -> Position {
    Position::new(Rc::new("TEST.ERB".to_string()), 3, 0)
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        position(),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().line, 3);
}

#[test]
fn test_identifier_not_found_is_syntax_error() {
    let error = Error::new(
        ErrorImpl::IdentifierNotFound {
            identifier: "FOO".to_string(),
        },
        position(),
    );

    assert_eq!(error.kind(), ErrorKind::IdentifierNotFound);
    assert!(error.is_syntax_error());
    assert!(!error.is_fatal_for_process());
}

#[test]
fn test_definition_conflict_kind() {
    let error = Error::new(
        ErrorImpl::VariableAlreadyDeclared {
            variable: "X".to_string(),
        },
        position(),
    );

    assert_eq!(error.kind(), ErrorKind::DefinitionConflict);
    assert!(!error.is_syntax_error());
}

#[test]
fn test_internal_invariant_is_fatal() {
    let error = Error::new(ErrorImpl::MacroMarkerReached, position());

    assert_eq!(error.kind(), ErrorKind::InternalInvariant);
    assert!(error.is_fatal_for_process());
    assert_eq!(error.severity(), Severity::Fatal);
}

#[test]
fn test_not_implemented_kind() {
    let error = Error::new(
        ErrorImpl::NotImplementedError {
            feature: "namespaced identifiers".to_string(),
        },
        position(),
    );

    assert_eq!(error.kind(), ErrorKind::NotImplemented);
    assert_eq!(error.get_impl().to_string(), "namespaced identifiers is not supported");
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(ErrorImpl::UnexpectedEndOfLine, position());

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(ErrorImpl::UnbalancedTernary, position());

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains('#')),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_display_carries_position() {
    let error = Error::new(ErrorImpl::AssignmentInExpression, position());

    assert_eq!(error.to_string(), "TEST.ERB:3: assignment used inside an expression");
}

#[test]
fn test_severity_levels() {
    assert_eq!(Severity::Info as u8, 0);
    assert_eq!(Severity::Warning as u8, 1);
    assert_eq!(Severity::Fatal as u8, 2);
    assert!(Severity::Warning < Severity::Fatal);
}

#[test]
fn test_diagnostics_collect() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.warn("comparison operators used consecutively", position());
    diagnostics.info("label overloads a builtin", position());
    diagnostics.error(&Error::new(ErrorImpl::ExpressionExpected, position()));

    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics.with_severity(Severity::Warning).count(), 1);
    assert_eq!(diagnostics.with_severity(Severity::Fatal).count(), 1);

    let taken = diagnostics.take();
    assert_eq!(taken.len(), 3);
    assert!(diagnostics.is_empty());
}
