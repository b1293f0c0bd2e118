use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

/// The broad class an error belongs to. Loaders use it to decide whether a
/// failure stays scoped to one file or has to stop the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    IdentifierNotFound,
    DefinitionConflict,
    NotImplemented,
    InternalInvariant,
}

/// Severity attached to every reported condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info = 0,
    Warning = 1,
    Fatal = 2,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Fatal => write!(f, "error"),
        }
    }
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn kind(&self) -> ErrorKind {
        match &self.internal_error {
            ErrorImpl::IdentifierNotFound { .. } => ErrorKind::IdentifierNotFound,
            ErrorImpl::DefinitionConflict { .. }
            | ErrorImpl::VariableAlreadyDeclared { .. }
            | ErrorImpl::FunctionAlreadyDeclared { .. } => ErrorKind::DefinitionConflict,
            ErrorImpl::NotImplementedError { .. } => ErrorKind::NotImplemented,
            ErrorImpl::InternalInvariant { .. }
            | ErrorImpl::RegistryFrozen { .. }
            | ErrorImpl::MacroMarkerReached => ErrorKind::InternalInvariant,
            _ => ErrorKind::Syntax,
        }
    }

    /// Identifier resolution failures are a flavour of syntax error.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Syntax | ErrorKind::IdentifierNotFound)
    }

    pub fn is_fatal_for_process(&self) -> bool {
        self.kind() == ErrorKind::InternalInvariant
    }

    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::UnexpectedEndOfLine => "UnexpectedEndOfLine",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::ExpressionExpected => "ExpressionExpected",
            ErrorImpl::InvalidUnaryOperator { .. } => "InvalidUnaryOperator",
            ErrorImpl::DuplicatePostfixOperator => "DuplicatePostfixOperator",
            ErrorImpl::PrefixAndPostfixIncrement => "PrefixAndPostfixIncrement",
            ErrorImpl::InvalidIncrementTarget => "InvalidIncrementTarget",
            ErrorImpl::AssignmentInExpression => "AssignmentInExpression",
            ErrorImpl::UnmatchedParenthesis => "UnmatchedParenthesis",
            ErrorImpl::EmptyParentheses => "EmptyParentheses",
            ErrorImpl::TernaryCloseWithoutOpen => "TernaryCloseWithoutOpen",
            ErrorImpl::UnbalancedTernary => "UnbalancedTernary",
            ErrorImpl::InsufficientTernaryOperands => "InsufficientTernaryOperands",
            ErrorImpl::OperandTypeMismatch { .. } => "OperandTypeMismatch",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArguments { .. } => "MissingArguments",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::SubKeyNotAllowed { .. } => "SubKeyNotAllowed",
            ErrorImpl::TooManyIndices { .. } => "TooManyIndices",
            ErrorImpl::NotAVariable { .. } => "NotAVariable",
            ErrorImpl::VariableNotWritable { .. } => "VariableNotWritable",
            ErrorImpl::ReservedWordMisuse { .. } => "ReservedWordMisuse",
            ErrorImpl::InvalidName { .. } => "InvalidName",
            ErrorImpl::IdentifierNotFound { .. } => "IdentifierNotFound",
            ErrorImpl::DefinitionConflict { .. } => "DefinitionConflict",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::NotImplementedError { .. } => "NotImplementedError",
            ErrorImpl::InternalInvariant { .. } => "InternalInvariant",
            ErrorImpl::RegistryFrozen { .. } => "RegistryFrozen",
            ErrorImpl::MacroMarkerReached => "MacroMarkerReached",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedEndOfLine => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`", token))
            }
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::AssignmentInExpression => ErrorTip::Suggestion(String::from(
                "Assignment used inside an expression, did you mean `==`?",
            )),
            ErrorImpl::PrefixAndPostfixIncrement => ErrorTip::Suggestion(String::from(
                "Increment and decrement cannot be both prefix and postfix",
            )),
            ErrorImpl::UnbalancedTernary => ErrorTip::Suggestion(String::from(
                "Every `?` needs a matching `#`",
            )),
            ErrorImpl::TernaryCloseWithoutOpen => ErrorTip::Suggestion(String::from(
                "Closing marker `#` without matching opening marker `?`",
            )),
            ErrorImpl::OperandTypeMismatch { operator, left, right } => {
                ErrorTip::Suggestion(format!(
                    "Operator `{}` cannot combine `{}` and `{}`",
                    operator, left, right
                ))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected at most {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::MissingArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected at least {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::ArgumentTypeMatchError { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Expected argument type `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::SubKeyNotAllowed { variable, .. } => ErrorTip::Suggestion(format!(
                "Variable `{}` cannot take an `@` sub-key",
                variable
            )),
            ErrorImpl::IdentifierNotFound { identifier } => {
                ErrorTip::Suggestion(format!("`{}` could not be resolved", identifier))
            }
            ErrorImpl::DefinitionConflict { name, existing } => ErrorTip::Suggestion(format!(
                "`{}` is already defined as {}",
                name, existing
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` already declared", variable))
            }
            ErrorImpl::FunctionAlreadyDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already declared", function))
            }
            ErrorImpl::NotImplementedError { .. } => ErrorTip::Suggestion(String::from(
                "This syntax is recognised, but is not supported",
            )),
            ErrorImpl::InternalInvariant { .. }
            | ErrorImpl::RegistryFrozen { .. }
            | ErrorImpl::MacroMarkerReached => ErrorTip::Suggestion(String::from(
                "This is an engine defect, not a script defect",
            )),
            other => ErrorTip::Suggestion(other.to_string()),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.position, self.internal_error)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("unexpected end of line")]
    UnexpectedEndOfLine,
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("expression expected")]
    ExpressionExpected,
    #[error("operator {operator:?} cannot be used as a prefix")]
    InvalidUnaryOperator { operator: String },
    #[error("more than one postfix operator applied to one operand")]
    DuplicatePostfixOperator,
    #[error("increment and decrement cannot combine prefix and postfix")]
    PrefixAndPostfixIncrement,
    #[error("increment and decrement need a writable integer variable")]
    InvalidIncrementTarget,
    #[error("assignment used inside an expression")]
    AssignmentInExpression,
    #[error("missing closing parenthesis")]
    UnmatchedParenthesis,
    #[error("empty parentheses")]
    EmptyParentheses,
    #[error("closing marker without matching opening marker")]
    TernaryCloseWithoutOpen,
    #[error("unbalanced ternary markers")]
    UnbalancedTernary,
    #[error("insufficient operands for ternary")]
    InsufficientTernaryOperands,
    #[error("operator {operator} cannot combine {left} and {right}")]
    OperandTypeMismatch { operator: String, left: String, right: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("too many arguments: expected at most {expected}, received {received}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("missing arguments: expected at least {expected}, received {received}")]
    MissingArguments { expected: usize, received: usize },
    #[error("argument types do not match: expected {expected}, received {received}")]
    ArgumentTypeMatchError { expected: String, received: String },
    #[error("variable {variable:?} cannot take sub-key {subkey:?}")]
    SubKeyNotAllowed { variable: String, subkey: String },
    #[error("variable {variable:?} takes {expected} index arguments, received {received}")]
    TooManyIndices { variable: String, expected: usize, received: usize },
    #[error("{name:?} is not a variable")]
    NotAVariable { name: String },
    #[error("variable {variable:?} cannot be written to")]
    VariableNotWritable { variable: String },
    #[error("reserved word {word:?} cannot be used here")]
    ReservedWordMisuse { word: String },
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
    #[error("identifier {identifier:?} not found")]
    IdentifierNotFound { identifier: String },
    #[error("{name:?} conflicts with {existing}")]
    DefinitionConflict { name: String, existing: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("function {function:?} already declared")]
    FunctionAlreadyDeclared { function: String },
    #[error("{feature} is not supported")]
    NotImplementedError { feature: String },
    #[error("internal invariant violated: {message}")]
    InternalInvariant { message: String },
    #[error("identifier registry is frozen, cannot add {name:?}")]
    RegistryFrozen { name: String },
    #[error("unexpanded macro marker reached the parser")]
    MacroMarkerReached,
}
