//! The layered identifier namespace.
//!
//! Builtin names (reserved words, system variables, instructions and
//! expression functions) are seeded on construction. Loading adds user
//! globals, macros, ref-methods, labels and per-label private variables;
//! `finish_loading` freezes the namespace for the body pass.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    sync::Arc,
};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    ast::terms::{CallTarget, CallTerm, Term, VariableTarget},
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorImpl},
    },
    instructions::{
        functions::{ExpressionFunction, EXPRESSION_FUNCTION_TABLE},
        registry::{InstructionDescriptor, InstructionRegistry},
    },
    lexer::tokens::Token,
    variables::{
        builtins::VariableCode,
        descriptor::{ValueType, VariableDescriptor},
    },
    Position,
};

use super::{config::Config, constants::ConstantTables, context::ParseContext};

lazy_static! {
    static ref NAME_PATTERN: Regex = Regex::new(r"^[\p{L}\p{N}_]+$").unwrap();

    pub static ref RESERVED_WORDS: HashSet<&'static str> = {
        let mut words = HashSet::new();
        for word in [
            "IS", "TO", "INT", "STR", "REF", "REFFUNC", "CONST", "STATIC", "DYNAMIC", "PRIVATE",
            "SAVEDATA", "CHARADATA", "__FILE__", "__LINE__", "__FUNCTION__",
        ] {
            words.insert(word);
        }
        words
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierCategory {
    ReservedWord,
    SystemVariable,
    SystemInstruction,
    SystemMethod,
    UserGlobal,
    UserMacro,
    UserRefMethod,
}

impl Display for IdentifierCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            IdentifierCategory::ReservedWord => "a reserved word",
            IdentifierCategory::SystemVariable => "a system variable",
            IdentifierCategory::SystemInstruction => "an instruction",
            IdentifierCategory::SystemMethod => "a builtin function",
            IdentifierCategory::UserGlobal => "a global variable",
            IdentifierCategory::UserMacro => "a macro",
            IdentifierCategory::UserRefMethod => "a function reference",
        };
        write!(f, "{}", text)
    }
}

/// A variable declared with `#DIM` or `#DIMS`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserVariable {
    pub name: String,
    pub descriptor: VariableDescriptor,
    pub sizes: Vec<i64>,
}

/// A label flagged `#FUNCTION` or `#FUNCTIONS`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunction {
    pub name: String,
    pub return_type: ValueType,
    pub parameters: Vec<ValueType>,
}

/// `#FUNCTION REF NAME`: a callable bound at run time.
#[derive(Debug, Clone, PartialEq)]
pub struct RefMethod {
    pub name: String,
    pub return_type: ValueType,
}

#[derive(Debug, Clone, Copy)]
pub enum Callable<'r> {
    Builtin(&'static ExpressionFunction),
    UserFunction(&'r UserFunction),
    RefMethod(&'r RefMethod),
}

impl<'r> Callable<'r> {
    pub fn name(&self) -> &str {
        match self {
            Callable::Builtin(function) => function.name,
            Callable::UserFunction(function) => &function.name,
            Callable::RefMethod(method) => &method.name,
        }
    }

    pub fn return_type(&self) -> ValueType {
        match self {
            Callable::Builtin(function) => function.return_type,
            Callable::UserFunction(function) => function.return_type,
            Callable::RefMethod(method) => method.return_type,
        }
    }

    pub fn target(&self) -> CallTarget {
        match self {
            Callable::Builtin(_) => CallTarget::Builtin,
            Callable::UserFunction(_) => CallTarget::UserFunction,
            Callable::RefMethod(_) => CallTarget::RefMethod,
        }
    }

    /// Ref-methods are bound at run time, so only their presence is checked.
    pub fn check_arguments(&self, arguments: &[Option<Term>]) -> Result<(), ErrorImpl> {
        match self {
            Callable::Builtin(function) => function.check_arguments(arguments),
            Callable::UserFunction(function) => {
                if arguments.len() > function.parameters.len() {
                    return Err(ErrorImpl::UnexpectedArguments {
                        expected: function.parameters.len(),
                        received: arguments.len(),
                    });
                }
                for (argument, expected) in arguments.iter().zip(&function.parameters) {
                    if let Some(argument) = argument {
                        if argument.result_type() != *expected {
                            return Err(ErrorImpl::ArgumentTypeMatchError {
                                expected: expected.to_string(),
                                received: argument.result_type().to_string(),
                            });
                        }
                    }
                }
                Ok(())
            }
            Callable::RefMethod(_) => Ok(()),
        }
    }

    pub fn call(&self, arguments: Vec<Option<Term>>) -> Result<Term, ErrorImpl> {
        self.check_arguments(&arguments)?;
        Ok(Term::Call(CallTerm {
            name: self.name().to_string(),
            target: self.target(),
            arguments,
            return_type: self.return_type(),
        }))
    }
}

/// What an identifier stands for in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Variable {
        name: String,
        target: VariableTarget,
        descriptor: VariableDescriptor,
    },
    Call(Term),
    Constant(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameKind {
    Variable,
    PrivateVariable,
    Macro,
    Function,
    Label,
}

#[derive(Debug)]
pub struct IdentifierRegistry {
    config: Config,
    instructions: Arc<InstructionRegistry>,
    constants: ConstantTables,
    categories: HashMap<String, IdentifierCategory>,
    globals: HashMap<String, UserVariable>,
    privates: HashMap<String, HashMap<String, UserVariable>>,
    macros: HashMap<String, Vec<Token>>,
    ref_methods: HashMap<String, RefMethod>,
    functions: HashMap<String, UserFunction>,
    labels: HashSet<String>,
    frozen: bool,
}

impl IdentifierRegistry {
    pub fn new(config: Config, instructions: Arc<InstructionRegistry>, constants: ConstantTables) -> Self {
        let constants = if config.case_insensitive { constants.folded() } else { constants };

        let mut categories = HashMap::new();
        for word in RESERVED_WORDS.iter() {
            categories.insert(word.to_string(), IdentifierCategory::ReservedWord);
        }
        for code in VariableCode::all() {
            categories
                .entry(code.name().to_string())
                .or_insert(IdentifierCategory::SystemVariable);
        }
        for name in instructions.names() {
            // Method instructions are expression functions called as statements.
            if instructions.lookup(name).is_some_and(|d| d.is_method()) {
                continue;
            }
            categories
                .entry(name.to_string())
                .or_insert(IdentifierCategory::SystemInstruction);
        }
        for function in EXPRESSION_FUNCTION_TABLE {
            categories
                .entry(function.name.to_string())
                .or_insert(IdentifierCategory::SystemMethod);
        }

        IdentifierRegistry {
            config,
            instructions,
            constants,
            categories,
            globals: HashMap::new(),
            privates: HashMap::new(),
            macros: HashMap::new(),
            ref_methods: HashMap::new(),
            functions: HashMap::new(),
            labels: HashSet::new(),
            frozen: false,
        }
    }

    /// The lookup key for `name` under the configured case rule.
    pub fn key(&self, name: &str) -> String {
        if self.config.case_insensitive {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn instructions(&self) -> &Arc<InstructionRegistry> {
        &self.instructions
    }

    pub fn constants(&self) -> &ConstantTables {
        &self.constants
    }

    pub fn category(&self, name: &str) -> Option<IdentifierCategory> {
        self.categories.get(&self.key(name)).copied()
    }

    pub fn lookup_instruction(&self, name: &str) -> Option<&InstructionDescriptor> {
        self.instructions.lookup(&self.key(name))
    }

    /// Like `lookup_instruction`, failing with `IdentifierNotFound`.
    pub fn find_instruction(&self, name: &str) -> Result<&InstructionDescriptor, ErrorImpl> {
        self.lookup_instruction(name)
            .ok_or_else(|| ErrorImpl::IdentifierNotFound { identifier: name.to_string() })
    }

    pub fn global(&self, name: &str) -> Option<&UserVariable> {
        self.globals.get(&self.key(name))
    }

    pub fn private(&self, label: &str, name: &str) -> Option<&UserVariable> {
        self.privates.get(&self.key(label))?.get(&self.key(name))
    }

    pub fn macro_body(&self, name: &str) -> Option<&[Token]> {
        self.macros.get(&self.key(name)).map(|body| body.as_slice())
    }

    pub fn has_macros(&self) -> bool {
        !self.macros.is_empty()
    }

    pub fn user_function(&self, name: &str) -> Option<&UserFunction> {
        self.functions.get(&self.key(name))
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains(&self.key(name))
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// A function usable inside an expression: user functions first, then
    /// builtins, then ref-methods.
    pub fn callable(&self, name: &str) -> Option<Callable<'_>> {
        let key = self.key(name);
        // A user function only shares a builtin's name when overloading is allowed.
        if let Some(function) = self.functions.get(&key) {
            return Some(Callable::UserFunction(function));
        }
        if let Some(function) = self.instructions.function(&key) {
            return Some(Callable::Builtin(function));
        }
        self.ref_methods.get(&key).map(Callable::RefMethod)
    }

    /// Resolves an identifier read inside an expression.
    ///
    /// Order: private variable of the current label, label-local slot,
    /// builtin or user global variable, zero-argument function call, then a
    /// keyword of `index_table` when the identifier is an array index.
    pub fn resolve(
        &self,
        name: &str,
        subkey: Option<&str>,
        context: &mut ParseContext,
        index_table: Option<&str>,
    ) -> Result<Resolution, ErrorImpl> {
        let key = self.key(name);

        if let Some(variable) = context.scope().and_then(|label| self.private(label, &key)) {
            if let Some(subkey) = subkey {
                return Err(ErrorImpl::SubKeyNotAllowed { variable: key, subkey: subkey.to_string() });
            }
            return Ok(Resolution::Variable {
                name: variable.name.clone(),
                target: VariableTarget::Private {
                    label: context.scope().unwrap_or_default().to_string(),
                    name: variable.name.clone(),
                },
                descriptor: variable.descriptor,
            });
        }

        if let Some(code) = VariableCode::from_name(&key) {
            let descriptor = code.descriptor();
            if descriptor.is_local() {
                let label = match subkey.or(context.scope()) {
                    Some(label) => self.key(label),
                    None => {
                        return Err(ErrorImpl::InvalidName {
                            name: key,
                            reason: String::from("label-local variable used outside of a label"),
                        })
                    }
                };
                context.record_local(code, &label);
                return Ok(Resolution::Variable {
                    name: key,
                    target: VariableTarget::Local { code, subkey: label },
                    descriptor,
                });
            }

            if let Some(subkey) = subkey {
                return Err(ErrorImpl::SubKeyNotAllowed { variable: key, subkey: subkey.to_string() });
            }
            return Ok(Resolution::Variable {
                name: key,
                target: VariableTarget::Builtin(code),
                descriptor,
            });
        }

        if let Some(variable) = self.globals.get(&key) {
            if let Some(subkey) = subkey {
                return Err(ErrorImpl::SubKeyNotAllowed { variable: key, subkey: subkey.to_string() });
            }
            return Ok(Resolution::Variable {
                name: variable.name.clone(),
                target: VariableTarget::Global(variable.name.clone()),
                descriptor: variable.descriptor,
            });
        }

        if let Some(callable) = self.callable(&key) {
            return callable.call(vec![]).map(Resolution::Call);
        }

        if let Some(index) = index_table.and_then(|table| self.constants.lookup(table, &key)) {
            return Ok(Resolution::Constant(index));
        }

        if self.categories.get(&key) == Some(&IdentifierCategory::ReservedWord) {
            return Err(ErrorImpl::ReservedWordMisuse { word: key });
        }
        Err(ErrorImpl::IdentifierNotFound { identifier: name.to_string() })
    }

    pub fn check_variable_name(
        &self,
        name: &str,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        self.check_name(name, NameKind::Variable, position, diagnostics)
    }

    pub fn check_macro_name(
        &self,
        name: &str,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        self.check_name(name, NameKind::Macro, position, diagnostics)
    }

    pub fn check_function_name(
        &self,
        name: &str,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        self.check_name(name, NameKind::Function, position, diagnostics)
    }

    pub fn check_label_name(
        &self,
        name: &str,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        self.check_name(name, NameKind::Label, position, diagnostics)
    }

    fn check_name(
        &self,
        name: &str,
        kind: NameKind,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        let invalid = |reason: &str| {
            Error::new(
                ErrorImpl::InvalidName { name: name.to_string(), reason: reason.to_string() },
                position.clone(),
            )
        };

        if !NAME_PATTERN.is_match(name) {
            return Err(invalid("only letters, digits and `_` are allowed"));
        }
        if name.chars().next().is_some_and(|c| c.is_numeric()) {
            return Err(invalid("names cannot start with a digit"));
        }

        let Some(category) = self.category(name) else {
            return Ok(());
        };
        let conflict = || {
            Error::new(
                ErrorImpl::DefinitionConflict { name: name.to_string(), existing: category.to_string() },
                position.clone(),
            )
        };

        match category {
            IdentifierCategory::ReservedWord | IdentifierCategory::SystemInstruction => Err(conflict()),
            IdentifierCategory::SystemMethod | IdentifierCategory::SystemVariable => match kind {
                NameKind::Function | NameKind::Label => {
                    if !self.config.allow_overloading {
                        return Err(conflict());
                    }
                    if self.config.warn_on_overload {
                        diagnostics.warn(format!("`{}` overrides {}", name, category), position.clone());
                    }
                    Ok(())
                }
                _ => Err(conflict()),
            },
            IdentifierCategory::UserMacro | IdentifierCategory::UserRefMethod => Err(conflict()),
            IdentifierCategory::UserGlobal => match kind {
                NameKind::Variable => Err(Error::new(
                    ErrorImpl::VariableAlreadyDeclared { variable: name.to_string() },
                    position.clone(),
                )),
                NameKind::PrivateVariable | NameKind::Label => Ok(()),
                NameKind::Macro | NameKind::Function => Err(conflict()),
            },
        }
    }

    fn ensure_loading(&self, name: &str, position: &Position) -> Result<(), Error> {
        if self.frozen {
            return Err(Error::new(ErrorImpl::RegistryFrozen { name: name.to_string() }, position.clone()));
        }
        Ok(())
    }

    pub fn add_user_variable(
        &mut self,
        mut variable: UserVariable,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        self.ensure_loading(&variable.name, position)?;
        self.check_variable_name(&variable.name, position, diagnostics)?;

        variable.name = self.key(&variable.name);
        self.categories.insert(variable.name.clone(), IdentifierCategory::UserGlobal);
        self.globals.insert(variable.name.clone(), variable);
        Ok(())
    }

    /// Private variables may shadow globals; two privates of one label may not
    /// share a name.
    pub fn add_private_variable(
        &mut self,
        label: &str,
        mut variable: UserVariable,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        self.ensure_loading(&variable.name, position)?;
        self.check_name(&variable.name, NameKind::PrivateVariable, position, diagnostics)?;

        variable.name = self.key(&variable.name);
        let label = self.key(label);
        let scope = self.privates.entry(label).or_default();
        if scope.contains_key(&variable.name) {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared { variable: variable.name },
                position.clone(),
            ));
        }
        scope.insert(variable.name.clone(), variable);
        Ok(())
    }

    pub fn add_macro(
        &mut self,
        name: &str,
        body: Vec<Token>,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        self.ensure_loading(name, position)?;
        self.check_macro_name(name, position, diagnostics)?;

        let key = self.key(name);
        self.categories.insert(key.clone(), IdentifierCategory::UserMacro);
        self.macros.insert(key, body);
        Ok(())
    }

    pub fn add_ref_method(
        &mut self,
        mut method: RefMethod,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        self.ensure_loading(&method.name, position)?;
        self.check_function_name(&method.name, position, diagnostics)?;

        method.name = self.key(&method.name);
        self.categories.insert(method.name.clone(), IdentifierCategory::UserRefMethod);
        self.ref_methods.insert(method.name.clone(), method);
        Ok(())
    }

    /// Registers a label. Returns false when the label already exists.
    pub fn add_label(
        &mut self,
        name: &str,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool, Error> {
        self.ensure_loading(name, position)?;
        self.check_label_name(name, position, diagnostics)?;

        let key = self.key(name);
        Ok(self.labels.insert(key))
    }

    /// Marks an existing label as expression-callable. Overload warnings were
    /// already reported when the label was added.
    pub fn add_user_function(&mut self, mut function: UserFunction, position: &Position) -> Result<(), Error> {
        self.ensure_loading(&function.name, position)?;
        self.check_name(&function.name, NameKind::Function, position, &mut Diagnostics::new())?;

        function.name = self.key(&function.name);
        if self.functions.contains_key(&function.name) {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDeclared { function: function.name },
                position.clone(),
            ));
        }
        self.functions.insert(function.name.clone(), function);
        Ok(())
    }

    /// Ends loading; every later mutation fails with `RegistryFrozen`.
    pub fn finish_loading(&mut self) {
        self.frozen = true;
    }
}
