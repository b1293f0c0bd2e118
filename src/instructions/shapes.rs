use std::fmt::Display;

/// How the text after an instruction name is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentShape {
    Void,
    /// An integer expression.
    Expression,
    /// An integer or string expression.
    AnyExpression,
    OptionalExpression,
    StrExpression,
    OptionalStrExpression,
    /// Comma separated integer or string expressions, any count.
    Expressions,
    /// The rest of the line, taken literally.
    RawString,
    Formatted,
    /// A bare variable reference, optional.
    Variable,
    /// `variable[, value]`
    VariableAssignment,
    /// `value, maximum, length`
    Bar,
    /// `counter, start, end[, step]`
    ForNext,
    /// `red, green, blue` or one packed colour value.
    SetColor,
    /// `file, description, variables...`
    SaveVariables,
    /// `NAME[, arguments]` or `NAME(arguments)`
    Call,
    /// Like `Call`, with the target given as a formatted string.
    CallForm,
    /// `CASE` conditions.
    Case,
    /// An expression function called as a statement.
    Method(&'static str),
}

impl Display for ArgumentShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgumentShape::Method(name) => write!(f, "Method({})", name),
            other => write!(f, "{:?}", other),
        }
    }
}
