use std::{collections::HashSet, rc::Rc};

use crate::{
    ast::{
        operators::OperatorCode,
        terms::{Term, VariableTerm},
    },
    errors::{diagnostics::Diagnostic, errors::Error},
    instructions::arguments::Arguments,
    parser::args::DefinitionArgument,
    variables::{builtins::VariableCode, descriptor::ValueType},
    Position,
};

/// One file handed to the loader. Files ending in `.ERH` are headers.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        SourceFile { name: name.into(), text: text.into() }
    }

    pub fn is_header(&self) -> bool {
        self.name.to_uppercase().ends_with(".ERH")
    }

    /// The text of a 1-based line, for error reports.
    pub fn line(&self, line: u32) -> Option<&str> {
        self.text.lines().nth((line as usize).checked_sub(1)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Instruction {
        name: &'static str,
        arguments: Arguments,
    },
    /// `target = value`, or `target op= value` when `operator` is set.
    Assignment {
        target: VariableTerm,
        operator: Option<OperatorCode>,
        value: Term,
    },
    /// A bare `X++` or `--X` line.
    Increment(Term),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub position: Position,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub position: Position,
    /// Return type when flagged `#FUNCTION` or `#FUNCTIONS`.
    pub function: Option<ValueType>,
    pub parameters: Vec<DefinitionArgument>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptFile {
    pub name: Rc<String>,
    pub labels: Vec<Label>,
    /// Label-local slots the file's bodies touch, as (slot, owning label).
    pub local_slots: HashSet<(VariableCode, String)>,
}

/// The outcome for one file of a batch. Diagnostics are kept even when the
/// file failed.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: Rc<String>,
    pub result: Result<ScriptFile, Error>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadedFile {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
