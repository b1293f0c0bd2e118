//! Expression parser.
//!
//! Turns the tokens of one script line into typed operand terms. Operators
//! are handled by an operator-precedence stack machine (`stack`); operands,
//! variable indices and calls by `expr`; argument lists by `args`; and the
//! templates of formatted strings by `formatted`.
//!
//! Every routine borrows the identifier registry and the parse context
//! explicitly. The first malformed construct ends the parse with an error.

pub mod args;
pub mod expr;
pub mod formatted;
pub mod parser;
pub mod stack;
