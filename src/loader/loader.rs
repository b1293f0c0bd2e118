//! Batch loading of header (`.ERH`) and script (`.ERB`) files.
//!
//! Loading runs in three passes so that every declaration is known before
//! any body is parsed:
//!
//! 1. headers: `#DIM`, `#DIMS`, `#DEFINE` and `#FUNCTION(S) REF`
//! 2. labels: `@NAME` lines with their `#FUNCTION(S)` flags and private
//!    `#DIM`s, then every label signature
//! 3. bodies: one statement per line, against the frozen registry
//!
//! A failing file keeps its first error and is skipped by later passes. Only
//! an internal invariant error stops the batch.

use std::{collections::HashSet, rc::Rc, sync::Arc};

use crate::{
    ast::{operators::OperatorCode, terms::Term},
    errors::errors::{Error, ErrorImpl},
    instructions::{arguments::parse_instruction_arguments, registry::InstructionRegistry, shapes::ArgumentShape},
    lexer::{lexer::tokenize_at, tokens::TokenKind},
    parser::{
        args::{parse_definition_arguments, DefinitionArgument},
        formatted::parse_formatted_string,
        parser::{Parser, Terminators},
    },
    registry::{
        config::Config,
        constants::ConstantTables,
        context::ParseContext,
        identifiers::{IdentifierRegistry, RefMethod, UserFunction, UserVariable},
    },
    variables::descriptor::{ValueType, VariableDescriptor, VariableFlags, VariableShape},
    Position,
};

use super::{
    expand::expand_macros,
    script::{Label, LoadedFile, ScriptFile, SourceFile, Statement, StatementKind},
};

const LIST: Terminators = Terminators::COMMA.union(Terminators::EOL);

struct LabelEntry {
    label: Label,
    /// Text after the label name and the column it starts at.
    signature: (String, u32),
    /// A later definition of an existing non-event label. Its body is skipped.
    duplicate: bool,
}

struct FileState<'s> {
    source: &'s SourceFile,
    context: ParseContext,
    labels: Vec<LabelEntry>,
    failure: Option<Error>,
}

impl<'s> FileState<'s> {
    fn new(source: &'s SourceFile) -> Self {
        FileState {
            source,
            context: ParseContext::new(Rc::new(source.name.clone())),
            labels: vec![],
            failure: None,
        }
    }

    fn is_live(&self) -> bool {
        self.failure.is_none()
    }

    /// Keeps a file-scoped error; hands back the ones that end the batch.
    fn record(&mut self, result: Result<(), Error>) -> Result<(), Error> {
        match result {
            Err(error) if error.is_fatal_for_process() => Err(error),
            Err(error) => {
                self.failure = Some(error);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}

enum AssignmentOperator {
    /// `=`
    Plain,
    /// `'=`
    Text,
    Compound(OperatorCode),
}

pub struct ScriptLoader {
    registry: IdentifierRegistry,
}

impl ScriptLoader {
    pub fn new(config: Config, constants: ConstantTables) -> Self {
        ScriptLoader::with_registry(IdentifierRegistry::new(config, InstructionRegistry::builtin(), constants))
    }

    pub fn with_instructions(config: Config, instructions: Arc<InstructionRegistry>, constants: ConstantTables) -> Self {
        ScriptLoader::with_registry(IdentifierRegistry::new(config, instructions, constants))
    }

    pub fn with_registry(registry: IdentifierRegistry) -> Self {
        ScriptLoader { registry }
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> IdentifierRegistry {
        self.registry
    }

    /// Loads every file, returning one result per file in input order.
    pub fn load_batch(&mut self, files: &[SourceFile]) -> Result<Vec<LoadedFile>, Error> {
        let mut states: Vec<FileState> = files.iter().map(FileState::new).collect();

        for state in states.iter_mut().filter(|s| s.source.is_header()) {
            let result = self.load_header(state);
            state.record(result)?;
        }
        for state in states.iter_mut().filter(|s| !s.source.is_header()) {
            let result = self.collect_labels(state);
            state.record(result)?;
        }
        for state in states.iter_mut().filter(|s| !s.source.is_header() && s.is_live()) {
            let result = self.register_signatures(state);
            state.record(result)?;
        }
        self.registry.finish_loading();

        states.into_iter().map(|state| self.load_bodies(state)).collect()
    }

    fn load_header(&mut self, state: &mut FileState) -> Result<(), Error> {
        for (line, column, text) in script_lines(&state.source.text) {
            state.context.line = line;
            let position = state.context.position(column);

            let Some(directive) = text.strip_prefix('#') else {
                return Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: first_word(text),
                        message: String::from("header files may only contain `#` directives"),
                    },
                    position,
                ));
            };
            let (word, rest, rest_column) = split_word(directive, column + 1);

            match word.to_uppercase().as_str() {
                "DIM" => self.declare_variable(&mut state.context, ValueType::Integer, rest, rest_column, None)?,
                "DIMS" => self.declare_variable(&mut state.context, ValueType::String, rest, rest_column, None)?,
                "DEFINE" => self.define_macro(&mut state.context, rest, rest_column)?,
                "FUNCTION" => self.declare_ref_method(&mut state.context, ValueType::Integer, rest, rest_column)?,
                "FUNCTIONS" => self.declare_ref_method(&mut state.context, ValueType::String, rest, rest_column)?,
                _ => return Err(unknown_directive(word, position)),
            }
        }
        Ok(())
    }

    /// `#DIM [SAVEDATA] [CHARADATA] [GLOBAL] NAME[, size...]`
    fn declare_variable(
        &mut self,
        context: &mut ParseContext,
        value_type: ValueType,
        text: &str,
        column: u32,
        label: Option<&str>,
    ) -> Result<(), Error> {
        let tokens = tokenize_at(text, Rc::clone(&context.file), context.line, column)?;

        let (name, flags, sizes, position) = {
            let mut parser = Parser::new(tokens, &self.registry, context);
            let mut flags = VariableFlags::NONE;
            loop {
                if parser.at_word("SAVEDATA") {
                    flags |= VariableFlags::SAVE_DATA;
                } else if parser.at_word("CHARADATA") {
                    flags |= VariableFlags::CHARACTER_DATA;
                } else if parser.at_word("GLOBAL") {
                    flags |= VariableFlags::GLOBAL;
                } else {
                    break;
                }
                parser.advance();
            }

            let position = parser.get_position();
            let name = parser.expect(TokenKind::Identifier)?.value;

            let mut sizes = vec![];
            while parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
                let size_position = parser.get_position();
                let size = parser.parse_required(LIST, false, false)?.restructure();
                match size.as_integer() {
                    Some(value) if value > 0 => sizes.push(value),
                    _ => {
                        return Err(Error::new(
                            ErrorImpl::UnexpectedTokenDetailed {
                                token: size.to_string(),
                                message: String::from("array sizes must be positive constants"),
                            },
                            size_position,
                        ))
                    }
                }
            }
            parser.expect_end()?;

            (name, flags, sizes, position)
        };

        let shape = VariableShape::from_dimension(sizes.len()).ok_or_else(|| {
            Error::new(
                ErrorImpl::TooManyIndices { variable: name.clone(), expected: 3, received: sizes.len() },
                position.clone(),
            )
        })?;
        let variable = UserVariable {
            name,
            descriptor: VariableDescriptor::user(shape, value_type, flags),
            sizes,
        };

        match label {
            Some(label) => self.registry.add_private_variable(label, variable, &position, &mut context.diagnostics),
            None => self.registry.add_user_variable(variable, &position, &mut context.diagnostics),
        }
    }

    /// `#DEFINE NAME body`
    fn define_macro(&mut self, context: &mut ParseContext, text: &str, column: u32) -> Result<(), Error> {
        let position = context.position(column);
        let (name, body, body_column) = split_word(text, column);
        if name.is_empty() {
            return Err(Error::new(ErrorImpl::UnexpectedEndOfLine, position));
        }

        let mut tokens = tokenize_at(body, Rc::clone(&context.file), context.line, body_column)?;
        tokens.retain(|token| token.kind != TokenKind::EOF);
        self.registry.add_macro(name, tokens, &position, &mut context.diagnostics)
    }

    /// `#FUNCTION REF NAME`
    fn declare_ref_method(
        &mut self,
        context: &mut ParseContext,
        return_type: ValueType,
        text: &str,
        column: u32,
    ) -> Result<(), Error> {
        let (keyword, name, name_column) = split_word(text, column);
        if !keyword.eq_ignore_ascii_case("REF") {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: keyword.to_string(),
                    message: String::from("functions declared in a header must be `REF`"),
                },
                context.position(column),
            ));
        }
        let position = context.position(name_column);
        if name.is_empty() {
            return Err(Error::new(ErrorImpl::UnexpectedEndOfLine, position));
        }

        let method = RefMethod { name: name.to_string(), return_type };
        self.registry.add_ref_method(method, &position, &mut context.diagnostics)
    }

    fn collect_labels(&mut self, state: &mut FileState) -> Result<(), Error> {
        let mut current: Option<usize> = None;

        for (line, column, text) in script_lines(&state.source.text) {
            state.context.line = line;
            let position = state.context.position(column);

            if let Some(definition) = text.strip_prefix('@') {
                let name_length = definition
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(definition.len());
                let (name, signature) = definition.split_at(name_length);

                let is_new = self.registry.add_label(name, &position, &mut state.context.diagnostics)?;
                let key = self.registry.key(name);
                let duplicate = !is_new && !is_event_label(&key);
                if duplicate && self.registry.config().warn_on_function_duplicate {
                    state.context.warn(
                        format!("label `{}` is already defined; this definition is ignored", name),
                        position.clone(),
                    );
                }

                state.labels.push(LabelEntry {
                    label: Label {
                        name: key,
                        position,
                        function: None,
                        parameters: vec![],
                        statements: vec![],
                    },
                    signature: (signature.to_string(), column + 1 + name_length as u32),
                    duplicate,
                });
                current = Some(state.labels.len() - 1);
                continue;
            }

            let Some(directive) = text.strip_prefix('#') else {
                continue;
            };
            let (word, rest, rest_column) = split_word(directive, column + 1);
            let Some(index) = current else {
                return Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: format!("#{}", word),
                        message: String::from("directive outside of a label"),
                    },
                    position,
                ));
            };
            let entry = &mut state.labels[index];

            match word.to_uppercase().as_str() {
                "DIM" | "DIMS" if entry.duplicate => {}
                "DIM" | "DIMS" => {
                    let value_type = if word.eq_ignore_ascii_case("DIMS") { ValueType::String } else { ValueType::Integer };
                    let label = entry.label.name.clone();
                    self.declare_variable(&mut state.context, value_type, rest, rest_column, Some(&label))?;
                }
                "FUNCTION" | "FUNCTIONS" if !rest.is_empty() => {
                    return Err(Error::new(
                        ErrorImpl::UnexpectedToken { token: first_word(rest) },
                        state.context.position(rest_column),
                    ));
                }
                "FUNCTION" => entry.label.function = Some(ValueType::Integer),
                "FUNCTIONS" => entry.label.function = Some(ValueType::String),
                _ => return Err(unknown_directive(word, position)),
            }
        }
        Ok(())
    }

    /// Parses label parameters now that every private variable is known,
    /// and makes `#FUNCTION` labels callable from expressions.
    fn register_signatures(&mut self, state: &mut FileState) -> Result<(), Error> {
        for entry in state.labels.iter_mut().filter(|entry| !entry.duplicate) {
            state.context.line = entry.label.position.line;
            state.context.enter_label(entry.label.name.clone());

            let (text, column) = &entry.signature;
            entry.label.parameters = parse_signature(&self.registry, &mut state.context, text, *column)?;

            if let Some(return_type) = entry.label.function {
                let function = UserFunction {
                    name: entry.label.name.clone(),
                    return_type,
                    parameters: entry
                        .label
                        .parameters
                        .iter()
                        .map(|parameter| parameter.target.descriptor.value_type())
                        .collect(),
                };
                self.registry.add_user_function(function, &entry.label.position)?;
            }
        }
        state.context.leave_label();
        Ok(())
    }

    fn load_bodies(&self, state: FileState) -> Result<LoadedFile, Error> {
        let FileState { source, mut context, labels, failure } = state;
        let name = Rc::clone(&context.file);

        let result = match failure {
            Some(error) => Err(error),
            None if source.is_header() => Ok(ScriptFile {
                name: Rc::clone(&name),
                labels: vec![],
                local_slots: HashSet::new(),
            }),
            None => match self.parse_bodies(source, &mut context, labels) {
                Ok(labels) => Ok(ScriptFile {
                    name: Rc::clone(&name),
                    labels,
                    local_slots: context.local_slots.clone(),
                }),
                Err(error) if error.is_fatal_for_process() => return Err(error),
                Err(error) => Err(error),
            },
        };

        Ok(LoadedFile { name, result, diagnostics: context.diagnostics.take() })
    }

    fn parse_bodies(
        &self,
        source: &SourceFile,
        context: &mut ParseContext,
        labels: Vec<LabelEntry>,
    ) -> Result<Vec<Label>, Error> {
        let mut entries = labels.into_iter();
        let mut current: Option<LabelEntry> = None;
        let mut finished = vec![];

        for (line, column, text) in script_lines(&source.text) {
            context.line = line;

            if text.starts_with('@') {
                finished.extend(current.take().filter(|entry| !entry.duplicate).map(|entry| entry.label));
                current = entries.next();
                match &current {
                    Some(entry) if !entry.duplicate => context.enter_label(entry.label.name.clone()),
                    _ => context.leave_label(),
                }
                continue;
            }
            if text.starts_with('#') {
                continue;
            }

            let Some(entry) = current.as_mut() else {
                return Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: first_word(text),
                        message: String::from("statement outside of a label"),
                    },
                    context.position(column),
                ));
            };
            if entry.duplicate {
                continue;
            }

            let statement = parse_statement(&self.registry, context, text, column)?;
            entry.label.statements.push(statement);
        }

        finished.extend(current.filter(|entry| !entry.duplicate).map(|entry| entry.label));
        Ok(finished)
    }
}

/// Non-blank, non-comment lines as (1-based line, indent column, text).
/// Event labels may be defined any number of times; every definition runs.
fn is_event_label(name: &str) -> bool {
    name.starts_with("EVENT")
}

fn script_lines(text: &str) -> impl Iterator<Item = (u32, u32, &str)> {
    text.lines().enumerate().filter_map(|(index, line)| {
        let trimmed = line.trim_start();
        let content = trimmed.trim_end();
        if content.is_empty() || content.starts_with(';') {
            return None;
        }
        Some((index as u32 + 1, (line.len() - trimmed.len()) as u32, content))
    })
}

/// Splits off the first whitespace separated word. Returns the word, the
/// remaining text without leading whitespace, and the column it starts at.
fn split_word(text: &str, column: u32) -> (&str, &str, u32) {
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    let (word, rest) = text.split_at(end);
    let trimmed = rest.trim_start();
    (word, trimmed, column + (text.len() - trimmed.len()) as u32)
}

fn first_word(text: &str) -> String {
    text.split_whitespace().next().unwrap_or_default().to_string()
}

fn unknown_directive(word: &str, position: Position) -> Error {
    Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: format!("#{}", word),
            message: String::from("unknown directive"),
        },
        position,
    )
}

/// `(ARG, ARG:1 = 2)` or `, ARG, ARG:1 = 2` after a label name.
fn parse_signature(
    registry: &IdentifierRegistry,
    context: &mut ParseContext,
    text: &str,
    column: u32,
) -> Result<Vec<DefinitionArgument>, Error> {
    let trimmed = text.trim_start();
    let column = column + (text.len() - trimmed.len()) as u32;

    let closing = match trimmed.chars().next() {
        None | Some(';') => return Ok(vec![]),
        Some('(') => TokenKind::CloseParen,
        Some(',') => TokenKind::EOF,
        Some(other) => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: other.to_string() },
                context.position(column),
            ))
        }
    };

    let tokens = tokenize_at(&trimmed[1..], Rc::clone(&context.file), context.line, column + 1)?;
    let mut parser = Parser::new(tokens, registry, context);
    let arguments = parse_definition_arguments(&mut parser, closing)?;
    parser.expect_end()?;
    Ok(arguments)
}

fn parse_statement(
    registry: &IdentifierRegistry,
    context: &mut ParseContext,
    text: &str,
    column: u32,
) -> Result<Statement, Error> {
    let position = context.position(column);

    let word_length = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let (word, rest) = text.split_at(word_length);
    let at_arguments = rest.is_empty() || rest.starts_with(char::is_whitespace);

    if let Some(descriptor) = registry.lookup_instruction(word).filter(|_| at_arguments) {
        let rest_column = column + word_length as u32;
        let arguments = match descriptor.shape {
            ArgumentShape::RawString | ArgumentShape::Formatted => {
                parse_instruction_arguments(descriptor, rest, rest_column, registry, context)?
            }
            _ => {
                let expanded = expand_macros(registry, rest, &position)?;
                parse_instruction_arguments(descriptor, &expanded, rest_column, registry, context)?
            }
        };
        return Ok(Statement {
            position,
            kind: StatementKind::Instruction { name: descriptor.name, arguments },
        });
    }

    let expanded = expand_macros(registry, text, &position)?;
    let kind = parse_assignment(registry, context, &expanded, column)?;
    Ok(Statement { position, kind })
}

/// The first top-level assignment operator as (offset, length, operator).
fn find_assignment(text: &str) -> Option<(usize, usize, AssignmentOperator)> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut index = 0;

    while index < bytes.len() {
        let byte = bytes[index];
        if quoted {
            match byte {
                b'\\' => index += 1,
                b'"' => quoted = false,
                _ => {}
            }
            index += 1;
            continue;
        }

        match byte {
            b'"' => quoted = true,
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                if bytes.get(index + 1) == Some(&b'=') {
                    index += 2;
                    continue;
                }
                let previous = index.checked_sub(1).map(|i| bytes[i]);
                let compound = match previous {
                    Some(b'\'') => return Some((index - 1, 2, AssignmentOperator::Text)),
                    Some(b'+') => OperatorCode::Plus,
                    Some(b'-') => OperatorCode::Minus,
                    Some(b'*') => OperatorCode::Mult,
                    Some(b'/') => OperatorCode::Div,
                    Some(b'%') => OperatorCode::Mod,
                    Some(b'&') => OperatorCode::BitAnd,
                    Some(b'|') => OperatorCode::BitOr,
                    Some(b'^') => OperatorCode::BitXor,
                    Some(b'!') | Some(b'<') | Some(b'>') => {
                        index += 1;
                        continue;
                    }
                    _ => return Some((index, 1, AssignmentOperator::Plain)),
                };
                return Some((index - 1, 2, AssignmentOperator::Compound(compound)));
            }
            _ => {}
        }
        index += 1;
    }

    None
}

/// `target = value`, `target op= value`, `target '= value`, or a bare
/// increment.
fn parse_assignment(
    registry: &IdentifierRegistry,
    context: &mut ParseContext,
    text: &str,
    column: u32,
) -> Result<StatementKind, Error> {
    let Some((offset, length, operator)) = find_assignment(text) else {
        let tokens = tokenize_at(text, Rc::clone(&context.file), context.line, column)?;
        let mut parser = Parser::new(tokens, registry, context);
        let position = parser.get_position();
        let term = parser.parse_required(Terminators::EOL, false, false)?;
        parser.expect_end()?;

        return match &term {
            Term::Unary { operator, .. } if operator.is_increment() => Ok(StatementKind::Increment(term)),
            _ => Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: term.to_string(),
                    message: String::from("only assignments and increments can stand alone"),
                },
                position,
            )),
        };
    };

    let (target, target_position) = {
        let tokens = tokenize_at(&text[..offset], Rc::clone(&context.file), context.line, column)?;
        let mut parser = Parser::new(tokens, registry, context);
        let position = parser.get_position();
        let target = parser.parse_required(Terminators::EOL, false, false)?;
        parser.expect_end()?;
        (target, position)
    };
    let target = match target {
        Term::Variable(variable) if variable.descriptor.is_writable() => variable,
        Term::Variable(variable) => {
            return Err(Error::new(ErrorImpl::VariableNotWritable { variable: variable.name }, target_position))
        }
        other => return Err(Error::new(ErrorImpl::NotAVariable { name: other.to_string() }, target_position)),
    };

    let value_text = &text[offset + length..];
    let trimmed = value_text.trim_start();
    let value_column = column + (offset + length + value_text.len() - trimmed.len()) as u32;
    let operator_position = context.position(column + offset as u32);
    let target_type = target.descriptor.value_type();

    match operator {
        AssignmentOperator::Text => {
            if target_type != ValueType::String {
                return Err(type_mismatch(ValueType::String, target_type, target_position));
            }
            let value = parse_value(registry, context, trimmed, value_column, Some(ValueType::String))?;
            Ok(StatementKind::Assignment { target, operator: None, value })
        }
        // A string target takes the rest of the line as a formatted string.
        AssignmentOperator::Plain if target_type == ValueType::String => {
            let start = context.position(value_column);
            let value = parse_formatted_string(registry, context, trimmed, start)?.restructure();
            Ok(StatementKind::Assignment { target, operator: None, value })
        }
        AssignmentOperator::Plain => {
            let value = parse_value(registry, context, trimmed, value_column, Some(target_type))?;
            Ok(StatementKind::Assignment { target, operator: None, value })
        }
        AssignmentOperator::Compound(code) => {
            let value = parse_value(registry, context, trimmed, value_column, None)?;
            let combined = Term::binary(code, Term::Variable(target.clone()), value.clone())
                .map_err(|error| Error::new(error, operator_position.clone()))?;
            if combined.result_type() != target_type {
                return Err(type_mismatch(target_type, combined.result_type(), operator_position));
            }
            Ok(StatementKind::Assignment { target, operator: Some(code), value })
        }
    }
}

fn parse_value(
    registry: &IdentifierRegistry,
    context: &mut ParseContext,
    text: &str,
    column: u32,
    expected: Option<ValueType>,
) -> Result<Term, Error> {
    let tokens = tokenize_at(text, Rc::clone(&context.file), context.line, column)?;
    let mut parser = Parser::new(tokens, registry, context);
    let position = parser.get_position();
    let value = parser.parse_required(Terminators::EOL, false, false)?.restructure();
    parser.expect_end()?;

    match expected {
        Some(expected) if value.result_type() != expected => {
            Err(type_mismatch(expected, value.result_type(), position))
        }
        _ => Ok(value),
    }
}

fn type_mismatch(expected: ValueType, received: ValueType, position: Position) -> Error {
    Error::new(
        ErrorImpl::TypeMatchError { expected: expected.to_string(), received: received.to_string() },
        position,
    )
}
