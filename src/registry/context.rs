use std::{collections::HashSet, rc::Rc};

use crate::{errors::diagnostics::Diagnostics, variables::builtins::VariableCode, Position};

/// Where the scanner currently is, passed explicitly to every parse call.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub file: Rc<String>,
    pub line: u32,
    /// Label whose body is being read.
    pub scope: Option<String>,
    /// Label-local slots referenced so far, as (slot, owning label).
    pub local_slots: HashSet<(VariableCode, String)>,
    pub diagnostics: Diagnostics,
}

impl ParseContext {
    pub fn new(file: Rc<String>) -> Self {
        ParseContext {
            file,
            line: 0,
            scope: None,
            local_slots: HashSet::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn position(&self, column: u32) -> Position {
        Position::new(Rc::clone(&self.file), self.line, column)
    }

    pub fn enter_label(&mut self, label: impl Into<String>) {
        self.scope = Some(label.into());
    }

    pub fn leave_label(&mut self) {
        self.scope = None;
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn record_local(&mut self, code: VariableCode, label: &str) {
        self.local_slots.insert((code, label.to_string()));
    }

    pub fn warn(&mut self, message: impl Into<String>, position: Position) {
        self.diagnostics.warn(message, position);
    }
}
