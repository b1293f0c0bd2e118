#![allow(clippy::module_inception)]

use std::{fmt::Display, rc::Rc};

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod errors;
pub mod instructions;
pub mod lexer;
pub mod loader;
pub mod macros;
pub mod parser;
pub mod registry;
pub mod variables;

extern crate regex;

/// A location inside a script: file name, 1-based line and 0-based column.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub file: Rc<String>,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: Rc<String>, line: u32, column: u32) -> Self {
        Position { file, line, column }
    }

    pub fn null() -> Self {
        Position::new(Rc::new(String::from("<null>")), 0, 0)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Renders an error against the source line it was raised on.
pub fn format_error(error: &Error, line_text: Option<&str>) -> String {
    /*
        Error: message
        -> SYSTEM.ERB:20
           |
        20 | A = 1 + #
           | --------^
    */

    let position = error.get_position();
    let line_string = position.line.to_string();
    let padding = line_string.len() + 2;

    let mut output = String::new();
    if let ErrorTip::None = error.get_tip() {
        output.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        output.push_str(&format!("Error: {} ({})\n", error.get_error_name(), error.get_tip()));
    }
    output.push_str(&format!("-> {}\n", position));

    if let Some(line_text) = line_text {
        output.push_str(&format!("{:>padding$}\n", "|"));

        let (line_text_removed, removed_whitespace) = remove_starting_whitespace(line_text);
        output.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim()));

        let arrows = (position.column as usize).saturating_sub(removed_whitespace) + 1;
        output.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));
    }

    output
}

pub fn display_error(error: &Error, line_text: Option<&str>) {
    print!("{}", format_error(error, line_text));
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (string.chars().skip(start).collect(), start)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{
        errors::errors::{Error, ErrorImpl},
        Position,
    };

    #[test]
    fn test_format_error_with_line() {
        let error = Error::new(
            ErrorImpl::UnexpectedToken { token: "#".to_string() },
            Position::new(Rc::new("SYSTEM.ERB".to_string()), 20, 12),
        );
        let output = super::format_error(&error, Some("    A = 1 + #"));

        assert!(output.starts_with("Error: UnexpectedToken"));
        assert!(output.contains("-> SYSTEM.ERB:20"));
        assert!(output.contains("20 | A = 1 + #"));
        assert!(output.contains("| --------^"));
    }

    #[test]
    fn test_format_error_without_line() {
        let error = Error::new(
            ErrorImpl::NotImplementedError { feature: "namespaces".to_string() },
            Position::null(),
        );
        let output = super::format_error(&error, None);

        assert_eq!(output.lines().count(), 2);
    }
}
