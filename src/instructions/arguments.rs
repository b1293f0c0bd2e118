//! Typed instruction arguments.
//!
//! `parse_instruction_arguments` reads the text after an instruction name
//! according to the instruction's `ArgumentShape`.

use std::rc::Rc;

use crate::{
    ast::{
        operators::OperatorCode,
        terms::{FormattedString, Term, VariableTerm},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::tokenize_at, tokens::TokenKind},
    parser::{
        args::parse_arguments,
        formatted::{find_top_level, parse_formatted_string},
        parser::{Parser, Terminators},
    },
    registry::{context::ParseContext, identifiers::IdentifierRegistry},
    variables::descriptor::ValueType,
    Position,
};

use super::{flags::InstructionFlags, registry::InstructionDescriptor, shapes::ArgumentShape};

#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    Rgb(Term, Term, Term),
    Packed(Term),
}

/// Where a jump goes: a label named in the source, or one computed from a
/// formatted string at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum JumpTarget {
    Static(String),
    Dynamic(FormattedString),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseCondition {
    Value(Term),
    /// `low TO high`
    Range(Term, Term),
    /// `IS op value`
    Is(OperatorCode, Term),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arguments {
    None,
    Expression(Option<Term>),
    Expressions(Vec<Option<Term>>),
    RawString(String),
    Formatted(FormattedString),
    Variable(Option<VariableTerm>),
    Assignment {
        target: VariableTerm,
        value: Option<Term>,
        range: Option<(Term, Term)>,
    },
    Bar {
        value: Term,
        maximum: Term,
        length: Term,
    },
    ForNext {
        counter: VariableTerm,
        start: Term,
        end: Term,
        step: Term,
    },
    Color(Color),
    SaveVariables {
        file: Term,
        description: Term,
        targets: Vec<VariableTerm>,
    },
    Call {
        target: JumpTarget,
        arguments: Vec<Option<Term>>,
    },
    Case(Vec<CaseCondition>),
    Method {
        name: &'static str,
        arguments: Vec<Option<Term>>,
    },
}

const LIST: Terminators = Terminators::COMMA.union(Terminators::EOL);

/// Parses `raw`, the text following the instruction name, which starts at
/// `column` of the current line.
pub fn parse_instruction_arguments(
    descriptor: &InstructionDescriptor,
    raw: &str,
    column: u32,
    registry: &IdentifierRegistry,
    context: &mut ParseContext,
) -> Result<Arguments, Error> {
    // One separator after the instruction name is not part of the argument.
    let (raw, column) = match raw.chars().next() {
        Some(c) if c.is_whitespace() => (&raw[c.len_utf8()..], column + 1),
        _ => (raw, column),
    };
    let position = context.position(column);

    match descriptor.shape {
        ArgumentShape::RawString => return Ok(Arguments::RawString(raw.to_string())),
        ArgumentShape::Formatted => {
            return parse_formatted_string(registry, context, raw, position).map(Arguments::Formatted)
        }
        ArgumentShape::CallForm => return parse_call_form(descriptor, raw, position, registry, context),
        _ => {}
    }

    let tokens = tokenize_at(raw, Rc::clone(&context.file), context.line, column)?;
    let mut parser = Parser::new(tokens, registry, context);

    let arguments = match descriptor.shape {
        ArgumentShape::Void => Arguments::None,
        ArgumentShape::Expression => Arguments::Expression(Some(required(&mut parser, ValueType::Integer)?)),
        ArgumentShape::AnyExpression => {
            Arguments::Expression(Some(parser.parse_required(Terminators::EOL, false, false)?))
        }
        ArgumentShape::StrExpression => Arguments::Expression(Some(required(&mut parser, ValueType::String)?)),
        ArgumentShape::OptionalExpression => Arguments::Expression(optional(&mut parser, ValueType::Integer)?),
        ArgumentShape::OptionalStrExpression => Arguments::Expression(optional(&mut parser, ValueType::String)?),
        ArgumentShape::Expressions => Arguments::Expressions(parse_arguments(&mut parser, TokenKind::EOF)?),
        ArgumentShape::Variable => {
            if parser.at_end() {
                Arguments::Variable(None)
            } else {
                Arguments::Variable(Some(writable_variable(&mut parser, None, true)?))
            }
        }
        ArgumentShape::VariableAssignment => parse_variable_assignment(&mut parser)?,
        ArgumentShape::Bar => {
            let value = list_item(&mut parser, ValueType::Integer)?;
            let maximum = list_item(&mut parser, ValueType::Integer)?;
            let length = required(&mut parser, ValueType::Integer)?;
            Arguments::Bar { value, maximum, length }
        }
        ArgumentShape::ForNext => parse_for_next(&mut parser)?,
        ArgumentShape::SetColor => {
            let first = required_in(&mut parser, LIST, ValueType::Integer)?;
            if parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
                let green = list_item(&mut parser, ValueType::Integer)?;
                let blue = required(&mut parser, ValueType::Integer)?;
                Arguments::Color(Color::Rgb(first, green, blue))
            } else {
                Arguments::Color(Color::Packed(first))
            }
        }
        ArgumentShape::SaveVariables => {
            let file = list_item(&mut parser, ValueType::String)?;
            let description = required_in(&mut parser, LIST, ValueType::String)?;
            let mut targets = vec![];
            while parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
                targets.push(variable_reference(&mut parser, true)?);
            }
            Arguments::SaveVariables { file, description, targets }
        }
        ArgumentShape::Call => parse_call(descriptor, &mut parser)?,
        ArgumentShape::Case => parse_case(&mut parser)?,
        ArgumentShape::Method(name) => {
            let arguments = parse_arguments(&mut parser, TokenKind::EOF)?;
            if let Some(function) = registry.instructions().function(name) {
                function.check_arguments(&arguments).map_err(|e| Error::new(e, position.clone()))?;
            }
            Arguments::Method { name, arguments }
        }
        ArgumentShape::RawString | ArgumentShape::Formatted | ArgumentShape::CallForm => {
            return Err(Error::new(
                ErrorImpl::InternalInvariant { message: format!("{} arguments read as tokens", descriptor.shape) },
                position,
            ))
        }
    };

    parser.expect_end()?;
    Ok(arguments)
}

fn check_type(term: Term, expected: ValueType, position: Position) -> Result<Term, Error> {
    if term.result_type() != expected {
        return Err(Error::new(
            ErrorImpl::TypeMatchError {
                expected: expected.to_string(),
                received: term.result_type().to_string(),
            },
            position,
        ));
    }
    Ok(term)
}

fn required_in(parser: &mut Parser, terminators: Terminators, expected: ValueType) -> Result<Term, Error> {
    let position = parser.get_position();
    let term = parser.parse_required(terminators, false, false)?;
    check_type(term, expected, position)
}

fn required(parser: &mut Parser, expected: ValueType) -> Result<Term, Error> {
    required_in(parser, Terminators::EOL, expected)
}

fn optional(parser: &mut Parser, expected: ValueType) -> Result<Option<Term>, Error> {
    let position = parser.get_position();
    match parser.parse_expression(Terminators::EOL, false, false)? {
        Some(term) => check_type(term, expected, position).map(Some),
        None => Ok(None),
    }
}

/// A required item followed by a comma.
fn list_item(parser: &mut Parser, expected: ValueType) -> Result<Term, Error> {
    let term = required_in(parser, LIST, expected)?;
    parser.expect(TokenKind::Comma)?;
    Ok(term)
}

/// With `variable_mode` a bare array name refers to the whole array.
fn variable_reference(parser: &mut Parser, variable_mode: bool) -> Result<VariableTerm, Error> {
    let position = parser.get_position();
    match parser.parse_required(LIST, false, variable_mode)? {
        Term::Variable(variable) => Ok(variable),
        other => Err(Error::new(ErrorImpl::NotAVariable { name: other.to_string() }, position)),
    }
}

fn writable_variable(
    parser: &mut Parser,
    expected: Option<ValueType>,
    variable_mode: bool,
) -> Result<VariableTerm, Error> {
    let position = parser.get_position();
    let variable = variable_reference(parser, variable_mode)?;
    if !variable.descriptor.is_writable() {
        return Err(Error::new(ErrorImpl::VariableNotWritable { variable: variable.name }, position));
    }
    if let Some(expected) = expected {
        if variable.descriptor.value_type() != expected {
            return Err(Error::new(
                ErrorImpl::TypeMatchError {
                    expected: expected.to_string(),
                    received: variable.descriptor.value_type().to_string(),
                },
                position,
            ));
        }
    }
    Ok(variable)
}

/// `VARSET variable[, value[, start, end]]`
fn parse_variable_assignment(parser: &mut Parser) -> Result<Arguments, Error> {
    let target = writable_variable(parser, None, true)?;
    if parser.current_token_kind() != TokenKind::Comma {
        return Ok(Arguments::Assignment { target, value: None, range: None });
    }
    parser.advance();

    let position = parser.get_position();
    let value = match parser.parse_expression(LIST, false, false)? {
        Some(value) => Some(check_type(value, target.descriptor.value_type(), position)?),
        None => None,
    };
    if parser.current_token_kind() != TokenKind::Comma {
        return Ok(Arguments::Assignment { target, value, range: None });
    }
    parser.advance();

    let start = list_item(parser, ValueType::Integer)?;
    let end = required(parser, ValueType::Integer)?;
    Ok(Arguments::Assignment { target, value, range: Some((start, end)) })
}

/// `FOR counter, start, end[, step]`
fn parse_for_next(parser: &mut Parser) -> Result<Arguments, Error> {
    let counter = writable_variable(parser, Some(ValueType::Integer), false)?;
    parser.expect(TokenKind::Comma)?;
    let start = list_item(parser, ValueType::Integer)?;
    let end = required_in(parser, LIST, ValueType::Integer)?;

    let step = if parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        required(parser, ValueType::Integer)?
    } else {
        Term::Integer(1)
    };
    Ok(Arguments::ForNext { counter, start, end, step })
}

/// `NAME`, `NAME, arguments` or `NAME(arguments)`. Unless the instruction is
/// a TRY variant the label has to exist.
fn parse_call(descriptor: &InstructionDescriptor, parser: &mut Parser) -> Result<Arguments, Error> {
    let position = parser.get_position();
    let name = parser.expect(TokenKind::Identifier)?.value;
    let registry = parser.registry();
    if !descriptor.has_flag(InstructionFlags::TRY) && !registry.has_label(&name) {
        return Err(Error::new(ErrorImpl::IdentifierNotFound { identifier: name }, position));
    }

    let arguments = call_arguments(parser)?;
    Ok(Arguments::Call { target: JumpTarget::Static(registry.key(&name)), arguments })
}

fn call_arguments(parser: &mut Parser) -> Result<Vec<Option<Term>>, Error> {
    match parser.current_token_kind() {
        TokenKind::OpenParen => {
            parser.advance();
            parse_arguments(parser, TokenKind::CloseParen)
        }
        TokenKind::Comma => {
            parser.advance();
            parse_arguments(parser, TokenKind::EOF)
        }
        TokenKind::EOF => Ok(vec![]),
        _ => Err(parser.unexpected()),
    }
}

/// `CALLFORM template[, arguments]` or `CALLFORM template(arguments)`. The
/// template ends at the first top-level `,` or `(`.
fn parse_call_form(
    descriptor: &InstructionDescriptor,
    raw: &str,
    position: Position,
    registry: &IdentifierRegistry,
    context: &mut ParseContext,
) -> Result<Arguments, Error> {
    let split = [find_top_level(raw, ','), find_top_level(raw, '(')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(raw.len());

    let template = raw[..split].trim_end();
    if template.is_empty() {
        return Err(Error::new(ErrorImpl::ExpressionExpected, position));
    }
    let target = parse_formatted_string(registry, context, template, position.clone())?;

    let column = position.column + split as u32;
    let tokens = tokenize_at(&raw[split..], Rc::clone(&context.file), context.line, column)?;
    let mut parser = Parser::new(tokens, registry, context);
    let arguments = call_arguments(&mut parser)?;
    parser.expect_end()?;

    let target = match target.clone().restructure() {
        Term::String(name) if !descriptor.has_flag(InstructionFlags::TRY) && !registry.has_label(&name) => {
            return Err(Error::new(ErrorImpl::IdentifierNotFound { identifier: name }, position));
        }
        Term::String(name) => JumpTarget::Static(registry.key(&name)),
        _ => JumpTarget::Dynamic(target),
    };
    Ok(Arguments::Call { target, arguments })
}

fn parse_case(parser: &mut Parser) -> Result<Arguments, Error> {
    let mut conditions = vec![];

    loop {
        let condition = if parser.at_word("IS") {
            parser.advance();
            let token = parser.current_token().clone();
            let operator = OperatorCode::from_token_kind(token.kind)
                .filter(|op| op.is_comparison())
                .ok_or_else(|| parser.unexpected())?;
            parser.advance();
            CaseCondition::Is(operator, parser.parse_required(LIST, false, false)?)
        } else {
            let low = parser.parse_required(LIST, true, false)?;
            if parser.at_word("TO") {
                parser.advance();
                let position = parser.get_position();
                let high = parser.parse_required(LIST, false, false)?;
                let high = check_type(high, low.result_type(), position)?;
                CaseCondition::Range(low, high)
            } else {
                CaseCondition::Value(low)
            }
        };
        conditions.push(condition);

        if parser.current_token_kind() != TokenKind::Comma {
            return Ok(Arguments::Case(conditions));
        }
        parser.advance();
    }
}
