//! Operands: literals, variables with their indices, function calls and
//! parenthesised subexpressions.

use crate::{
    ast::terms::{Term, VariableTarget, VariableTerm},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    registry::identifiers::Resolution,
    variables::descriptor::{ValueType, VariableDescriptor},
    Position,
};

use super::{
    args::parse_arguments,
    formatted::parse_formatted_string,
    parser::{Parser, Terminators},
};

pub fn parse_operand(parser: &mut Parser, variable_mode: bool) -> Result<Term, Error> {
    match parser.current_token_kind() {
        TokenKind::Number => {
            let token = parser.advance();
            parse_number(&token).map(Term::Integer)
        }
        TokenKind::String => Ok(Term::String(parser.advance().value)),
        TokenKind::FormattedString => {
            let token = parser.advance();
            let mut start = token.span.start.clone();
            start.column += 2;
            let formatted =
                parse_formatted_string(parser.registry(), parser.context_mut(), &token.value, start)?;
            Ok(Term::Formatted(formatted))
        }
        TokenKind::Identifier => parse_identifier(parser, variable_mode),
        TokenKind::OpenParen => parse_parenthesized(parser),
        _ => Err(parser.unexpected()),
    }
}

pub fn parse_number(token: &Token) -> Result<i64, Error> {
    let text = token.value.as_str();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(binary) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(binary, 2)
    } else {
        text.parse::<i64>()
    };

    parsed.map_err(|_| {
        Error::new(ErrorImpl::NumberParseError { token: token.value.clone() }, token.span.start.clone())
    })
}

/// `(` expression `)`. The closing parenthesis is consumed.
fn parse_parenthesized(parser: &mut Parser) -> Result<Term, Error> {
    let open = parser.advance();
    let position = open.span.start;

    let inner = parser.parse_expression(Terminators::RIGHT_PAREN, false, false)?;
    if parser.current_token_kind() != TokenKind::CloseParen {
        return Err(Error::new(ErrorImpl::UnmatchedParenthesis, position));
    }
    let term = inner.ok_or_else(|| Error::new(ErrorImpl::EmptyParentheses, position))?;
    parser.advance();
    Ok(term)
}

fn parse_identifier(parser: &mut Parser, variable_mode: bool) -> Result<Term, Error> {
    let token = parser.advance();
    let position = token.span.start.clone();
    let registry = parser.registry();

    if parser.current_token_kind() == TokenKind::Colon && parser.peek().kind == TokenKind::Colon {
        return Err(Error::new(
            ErrorImpl::NotImplementedError { feature: String::from("namespaced identifiers") },
            position,
        ));
    }

    if parser.current_token_kind() == TokenKind::OpenParen {
        let Some(callable) = registry.callable(&token.value) else {
            return Err(Error::new(ErrorImpl::IdentifierNotFound { identifier: token.value }, position));
        };
        parser.advance();
        let arguments = parse_arguments(parser, TokenKind::CloseParen)?;
        return callable.call(arguments).map_err(|e| Error::new(e, position));
    }

    let subkey = parse_subkey(parser)?;
    let resolution = registry
        .resolve(&token.value, subkey.as_deref(), parser.context_mut(), None)
        .map_err(|e| Error::new(e, position.clone()))?;

    match resolution {
        Resolution::Variable { name, target, descriptor } => {
            parse_variable_indices(parser, name, target, descriptor, variable_mode, position)
        }
        Resolution::Call(term) => Ok(term),
        Resolution::Constant(value) => Ok(Term::Integer(value)),
    }
}

/// `@SUBKEY` after a variable name.
fn parse_subkey(parser: &mut Parser) -> Result<Option<String>, Error> {
    if parser.current_token_kind() != TokenKind::At {
        return Ok(None);
    }
    parser.advance();
    let subkey = parser.expect(TokenKind::Identifier)?;
    Ok(Some(subkey.value))
}

/// Reads `:index` arguments after a resolved variable.
///
/// Character data takes one extra leading index naming the character; when
/// it is left out the character is implicit.
pub fn parse_variable_indices(
    parser: &mut Parser,
    name: String,
    target: VariableTarget,
    descriptor: VariableDescriptor,
    variable_mode: bool,
    position: Position,
) -> Result<Term, Error> {
    let table = match &target {
        VariableTarget::Builtin(code) => code.constant_table(),
        _ => None,
    };

    let mut arguments = vec![];
    while parser.current_token_kind() == TokenKind::Colon {
        parser.advance();
        arguments.push(parse_index(parser, table)?);
    }

    let dimension = descriptor.index_count();
    let max = dimension + descriptor.is_character_data() as usize;
    if arguments.len() > max {
        return Err(Error::new(
            ErrorImpl::TooManyIndices { variable: name, expected: max, received: arguments.len() },
            position,
        ));
    }

    let character = if descriptor.is_character_data() && arguments.len() == max {
        Some(Box::new(arguments.remove(0)))
    } else {
        None
    };
    let mut indices = arguments;
    if !variable_mode {
        indices.resize(dimension, Term::Integer(0));
    }

    Ok(Term::Variable(VariableTerm { name, target, descriptor, character, indices }))
}

/// One index argument: a literal, an identifier without indices of its own,
/// or a parenthesised expression.
fn parse_index(parser: &mut Parser, table: Option<&str>) -> Result<Term, Error> {
    let registry = parser.registry();
    let token = parser.current_token().clone();
    let position = token.span.start.clone();

    let term = match token.kind {
        TokenKind::Number => {
            parser.advance();
            Term::Integer(parse_number(&token)?)
        }
        TokenKind::String => {
            parser.advance();
            let keyword = registry.key(&token.value);
            match table.and_then(|table| registry.constants().lookup(table, &keyword)) {
                Some(index) => Term::Integer(index),
                None => Term::String(token.value),
            }
        }
        TokenKind::OpenParen => parse_parenthesized(parser)?,
        TokenKind::Identifier => {
            parser.advance();
            let subkey = parse_subkey(parser)?;
            let resolution = registry
                .resolve(&token.value, subkey.as_deref(), parser.context_mut(), table)
                .map_err(|e| Error::new(e, position.clone()))?;
            match resolution {
                Resolution::Variable { name, target, descriptor } => {
                    let indices = vec![Term::Integer(0); descriptor.index_count()];
                    Term::Variable(VariableTerm { name, target, descriptor, character: None, indices })
                }
                Resolution::Call(term) => term,
                Resolution::Constant(value) => Term::Integer(value),
            }
        }
        _ => return Err(parser.unexpected()),
    };

    if let Term::String(_) = term {
        return Ok(term);
    }
    if term.result_type() != ValueType::Integer {
        return Err(Error::new(
            ErrorImpl::TypeMatchError {
                expected: ValueType::Integer.to_string(),
                received: term.result_type().to_string(),
            },
            position,
        ));
    }
    Ok(term)
}
