//! Lexical analysis module for the front end.
//!
//! This module contains the line tokenizer and the token cursor consumed by
//! the expression parser. It handles:
//!
//! - Tokenization of one script line using anchored regex patterns
//! - Integer, string and formatted string literals
//! - Operators, punctuation and `;` comments
//! - Token position tracking (file, line, column) for error reporting

pub mod lexer;
pub mod stream;
pub mod tokens;
