//! Macro substitution.
//!
//! `#DEFINE` bodies are stored as tokens. Before a body line is parsed every
//! identifier naming a macro is replaced by the rendered body, repeatedly, so
//! macros may use other macros. Quoted text is left alone.

use std::borrow::Cow;

use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    registry::identifiers::IdentifierRegistry,
    Position,
};

const MAX_EXPANSION_DEPTH: usize = 16;

/// Writes tokens back as source text that tokenizes to the same kinds.
pub fn render_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|token| token.kind != TokenKind::EOF)
        .map(|token| match token.kind {
            TokenKind::String => format!("\"{}\"", token.value.replace('\\', "\\\\").replace('"', "\\\"")),
            TokenKind::FormattedString => format!("@\"{}\"", token.value),
            _ => token.value.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Substitutes every macro in `text`. Fails when expansion keeps producing
/// macro names, which means two macros refer to each other.
pub fn expand_macros<'t>(
    registry: &IdentifierRegistry,
    text: &'t str,
    position: &Position,
) -> Result<Cow<'t, str>, Error> {
    if !registry.has_macros() {
        return Ok(Cow::Borrowed(text));
    }

    let mut current = Cow::Borrowed(text);
    for _ in 0..MAX_EXPANSION_DEPTH {
        match expand_once(registry, &current) {
            (_, None) => return Ok(current),
            (expanded, Some(_)) => current = Cow::Owned(expanded),
        }
    }

    let (_, name) = expand_once(registry, &current);
    match name {
        None => Ok(current),
        Some(name) => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: name,
                message: String::from("macro expansion does not terminate"),
            },
            position.clone(),
        )),
    }
}

/// One substitution sweep. Returns the new text and the last macro replaced.
fn expand_once(registry: &IdentifierRegistry, text: &str) -> (String, Option<String>) {
    let mut output = String::with_capacity(text.len());
    let mut expanded = None;
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == '"' {
            output.push(c);
            while let Some((_, c)) = chars.next() {
                output.push(c);
                if c == '\\' {
                    if let Some((_, escaped)) = chars.next() {
                        output.push(escaped);
                    }
                } else if c == '"' {
                    break;
                }
            }
            continue;
        }

        if c.is_alphanumeric() || c == '_' {
            let mut end = start + c.len_utf8();
            while let Some(&(index, next)) = chars.peek() {
                if !(next.is_alphanumeric() || next == '_') {
                    break;
                }
                end = index + next.len_utf8();
                chars.next();
            }

            let word = &text[start..end];
            match registry.macro_body(word) {
                Some(body) if !c.is_numeric() => {
                    output.push_str(&render_tokens(body));
                    expanded = Some(word.to_string());
                }
                _ => output.push_str(word),
            }
            continue;
        }

        output.push(c);
    }

    (output, expanded)
}
