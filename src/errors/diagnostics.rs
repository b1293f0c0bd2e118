use std::fmt::Display;

use crate::Position;

use super::errors::{Error, Severity};

/// A reported condition that does not necessarily stop parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub position: Option<Position>,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{} ({}): {}", self.severity, position, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Collects warnings and informational messages for one file.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics { entries: vec![] }
    }

    pub fn report(&mut self, severity: Severity, message: impl Into<String>, position: Option<Position>) {
        self.entries.push(Diagnostic {
            severity,
            message: message.into(),
            position,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>, position: Position) {
        self.report(Severity::Warning, message, Some(position));
    }

    pub fn error(&mut self, error: &Error) {
        self.report(
            error.severity(),
            error.get_impl().to_string(),
            Some(error.get_position().clone()),
        );
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.severity == severity)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}
