use crate::{Position, Span};

use super::tokens::{Token, TokenKind};

/// Cursor over a tokenized line with one token of lookahead.
///
/// The stream always ends with an `EOF` token; reading past the end keeps
/// returning it.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::EOF) {
            let span = tokens
                .last()
                .map(|t| Span { start: t.span.end.clone(), end: t.span.end.clone() })
                .unwrap_or(Span { start: Position::null(), end: Position::null() });
            tokens.push(Token { kind: TokenKind::EOF, value: String::from("EOF"), span });
        }

        TokenStream { tokens, pos: 0 }
    }

    pub fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    pub fn peek(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    /// Moves past the current token and returns it.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub fn at_end(&self) -> bool {
        self.current_kind() == TokenKind::EOF
    }

    pub fn index(&self) -> usize {
        self.pos
    }

    pub fn get_position(&self) -> Position {
        self.current().span.start.clone()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
