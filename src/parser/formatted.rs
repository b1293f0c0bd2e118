//! Formatted string templates.
//!
//! A template mixes literal text with embedded parts:
//!
//! - `{expr[, width[, LEFT|RIGHT]]}` an integer expression
//! - `%expr[, width[, LEFT|RIGHT]]%` a string expression
//! - `\@cond ? then # else\@` an inline choice between two templates
//!
//! Embedded expressions are tokenized on their own and parsed with the same
//! registry and context as the surrounding line.

use std::rc::Rc;

use crate::{
    ast::terms::{Alignment, FormatPart, FormattedString},
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::tokenize_at, tokens::TokenKind},
    registry::{context::ParseContext, identifiers::IdentifierRegistry},
    variables::descriptor::ValueType,
    Position,
};

use super::parser::{Parser, Terminators};

const CONDITIONAL_MARKER: &str = "\\@";

/// Parses the text of a template. `start` is the position of its first
/// character.
pub fn parse_formatted_string(
    registry: &IdentifierRegistry,
    context: &mut ParseContext,
    template: &str,
    start: Position,
) -> Result<FormattedString, Error> {
    let at = |offset: usize| {
        let mut position = start.clone();
        position.column += offset as u32;
        position
    };
    let unterminated = |marker: &str, offset: usize| {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: marker.to_string(),
                message: String::from("formatted string part is never closed"),
            },
            at(offset),
        )
    };

    let mut parts = vec![];
    let mut text = String::new();
    let mut pos = 0;

    while let Some(ch) = template[pos..].chars().next() {
        match ch {
            '\\' => match template[pos + 1..].chars().next() {
                Some('@') => {
                    let body = pos + CONDITIONAL_MARKER.len();
                    let end = template[body..]
                        .find(CONDITIONAL_MARKER)
                        .map(|i| body + i)
                        .ok_or_else(|| unterminated(CONDITIONAL_MARKER, pos))?;
                    flush_text(&mut parts, &mut text);
                    parts.push(parse_conditional(registry, context, &template[body..end], at(body))?);
                    pos = end + CONDITIONAL_MARKER.len();
                }
                Some(escaped) => {
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    pos += 1 + escaped.len_utf8();
                }
                None => {
                    text.push('\\');
                    pos += 1;
                }
            },
            '{' | '%' => {
                let (close, expected) = match ch {
                    '{' => ('}', ValueType::Integer),
                    _ => ('%', ValueType::String),
                };
                let body = pos + 1;
                let end = find_closing(template, body, ch, close).ok_or_else(|| unterminated(&ch.to_string(), pos))?;
                flush_text(&mut parts, &mut text);
                parts.push(parse_embedded(registry, context, &template[body..end], at(body), expected)?);
                pos = end + 1;
            }
            _ => {
                text.push(ch);
                pos += ch.len_utf8();
            }
        }
    }
    flush_text(&mut parts, &mut text);

    Ok(FormattedString { parts })
}

fn flush_text(parts: &mut Vec<FormatPart>, text: &mut String) {
    if !text.is_empty() {
        parts.push(FormatPart::Text(std::mem::take(text)));
    }
}

/// Byte offset of the `close` that ends a part starting at `from`. Quoted
/// strings and nested pairs are skipped.
fn find_closing(template: &str, from: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in template[from..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            _ if ch == close && depth == 0 => return Some(from + i),
            _ if ch == close => depth -= 1,
            _ if ch == open => depth += 1,
            _ => {}
        }
    }
    None
}

/// Byte offset of the first `marker` outside quotes, braces and `%` pairs.
pub(crate) fn find_top_level(text: &str, marker: char) -> Option<usize> {
    let mut depth = 0;
    let mut in_string = false;
    let mut in_percent = false;

    for (i, ch) in text.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            _ if in_string => {}
            '%' => in_percent = !in_percent,
            '{' => depth += 1,
            '}' => depth -= 1,
            _ if ch == marker && depth == 0 && !in_percent => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_embedded(
    registry: &IdentifierRegistry,
    context: &mut ParseContext,
    source: &str,
    start: Position,
    expected: ValueType,
) -> Result<FormatPart, Error> {
    let tokens = tokenize_at(source, Rc::clone(&start.file), start.line, start.column)?;
    let mut parser = Parser::new(tokens, registry, context);
    let terminators = Terminators::COMMA | Terminators::EOL;

    let term = parser.parse_required(terminators, false, false)?;
    if term.result_type() != expected {
        return Err(Error::new(
            ErrorImpl::TypeMatchError {
                expected: expected.to_string(),
                received: term.result_type().to_string(),
            },
            start,
        ));
    }

    let mut width = None;
    let mut alignment = Alignment::Right;
    if parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        let position = parser.get_position();
        width = parser.parse_expression(terminators, false, false)?;
        if width.as_ref().is_some_and(|w| w.result_type() != ValueType::Integer) {
            return Err(Error::new(
                ErrorImpl::TypeMatchError {
                    expected: ValueType::Integer.to_string(),
                    received: ValueType::String.to_string(),
                },
                position,
            ));
        }

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
            alignment = if parser.at_word("LEFT") {
                Alignment::Left
            } else if parser.at_word("RIGHT") {
                Alignment::Right
            } else {
                return Err(parser.unexpected());
            };
            parser.advance();
        }
    }
    parser.expect_end()?;

    Ok(FormatPart::Expression { term, width, alignment })
}

/// `cond ? then # else` between two `\@` markers.
fn parse_conditional(
    registry: &IdentifierRegistry,
    context: &mut ParseContext,
    body: &str,
    start: Position,
) -> Result<FormatPart, Error> {
    let at = |offset: usize| {
        let mut position = start.clone();
        position.column += offset as u32;
        position
    };

    let question = find_top_level(body, '?').ok_or_else(|| Error::new(ErrorImpl::UnbalancedTernary, at(0)))?;
    let branches = &body[question + 1..];
    let hash = find_top_level(branches, '#')
        .map(|i| question + 1 + i)
        .ok_or_else(|| Error::new(ErrorImpl::UnbalancedTernary, at(question)))?;

    let tokens = tokenize_at(&body[..question], Rc::clone(&start.file), start.line, start.column)?;
    let mut parser = Parser::new(tokens, registry, context);
    let condition = parser.parse_required(Terminators::EOL, false, false)?;
    parser.expect_end()?;
    if condition.result_type() != ValueType::Integer {
        return Err(Error::new(
            ErrorImpl::TypeMatchError {
                expected: ValueType::Integer.to_string(),
                received: condition.result_type().to_string(),
            },
            at(0),
        ));
    }

    let (then_text, then_offset) = trimmed(body, question + 1, hash);
    let (else_text, else_offset) = trimmed(body, hash + 1, body.len());
    let then_branch = parse_formatted_string(registry, context, then_text, at(then_offset))?;
    let else_branch = parse_formatted_string(registry, context, else_text, at(else_offset))?;

    Ok(FormatPart::Conditional { condition, then_branch, else_branch })
}

/// `body[from..to]` without surrounding spaces, and the offset it starts at.
fn trimmed(body: &str, from: usize, to: usize) -> (&str, usize) {
    let slice = &body[from..to];
    let leading = slice.len() - slice.trim_start().len();
    (slice.trim(), from + leading)
}
