//! Parser state shared by the expression routines.
//!
//! A `Parser` owns the token stream of one line (or one embedded fragment)
//! and borrows the identifier registry and the parse context for the
//! duration of the parse. It never recovers from an error: the first
//! malformed construct ends the parse with `Err`.

use std::ops::BitOr;

use crate::{
    ast::terms::Term,
    errors::errors::{Error, ErrorImpl},
    lexer::{
        stream::TokenStream,
        tokens::{Token, TokenKind},
    },
    registry::{context::ParseContext, identifiers::IdentifierRegistry},
    Position,
};

use super::stack::parse_stack_expression;

/// Token kinds that end an expression. The parser stops on the terminator
/// without consuming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Terminators(u8);

impl Terminators {
    pub const NONE: Terminators = Terminators(0);
    pub const EOL: Terminators = Terminators(1 << 0);
    pub const COMMA: Terminators = Terminators(1 << 1);
    pub const RIGHT_PAREN: Terminators = Terminators(1 << 2);
    pub const RIGHT_BRACKET: Terminators = Terminators(1 << 3);
    /// `=` and every compound assignment.
    pub const ASSIGNMENT: Terminators = Terminators(1 << 4);

    pub const fn union(self, other: Terminators) -> Terminators {
        Terminators(self.0 | other.0)
    }

    pub const fn contains(&self, other: Terminators) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn matches(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::EOF => self.contains(Terminators::EOL),
            TokenKind::Comma => self.contains(Terminators::COMMA),
            TokenKind::CloseParen => self.contains(Terminators::RIGHT_PAREN),
            TokenKind::CloseBracket => self.contains(Terminators::RIGHT_BRACKET),
            kind if kind.is_assignment() => self.contains(Terminators::ASSIGNMENT),
            _ => false,
        }
    }
}

impl BitOr for Terminators {
    type Output = Terminators;

    fn bitor(self, rhs: Terminators) -> Terminators {
        self.union(rhs)
    }
}

pub struct Parser<'a> {
    stream: TokenStream,
    registry: &'a IdentifierRegistry,
    context: &'a mut ParseContext,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, registry: &'a IdentifierRegistry, context: &'a mut ParseContext) -> Self {
        Parser {
            stream: TokenStream::new(tokens),
            registry,
            context,
        }
    }

    pub fn registry(&self) -> &'a IdentifierRegistry {
        self.registry
    }

    pub fn context(&self) -> &ParseContext {
        &*self.context
    }

    pub fn context_mut(&mut self) -> &mut ParseContext {
        &mut *self.context
    }

    pub fn stream(&self) -> &TokenStream {
        &self.stream
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        self.stream.current()
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.stream.current_kind()
    }

    pub fn peek(&self) -> &Token {
        self.stream.peek()
    }

    /// Advances to the next token and returns the previous one.
    pub fn advance(&mut self) -> Token {
        self.stream.advance()
    }

    pub fn at_end(&self) -> bool {
        self.stream.at_end()
    }

    pub fn get_position(&self) -> Position {
        self.stream.get_position()
    }

    /// True when the current token is the identifier `word`.
    pub fn at_word(&self, word: &str) -> bool {
        self.current_token().is_word(word, self.registry.config().case_insensitive)
    }

    /// An error located at the current token.
    pub fn error(&self, error: ErrorImpl) -> Error {
        Error::new(error, self.get_position())
    }

    pub fn unexpected(&self) -> Error {
        let token = self.current_token();
        match token.kind {
            TokenKind::EOF => self.error(ErrorImpl::UnexpectedEndOfLine),
            _ => self.error(ErrorImpl::UnexpectedToken { token: token.value.clone() }),
        }
    }

    /// Expects a token of the given kind, with an optional custom error.
    pub fn expect_error(&mut self, expected_kind: TokenKind, error: Option<Error>) -> Result<Token, Error> {
        if self.current_token_kind() != expected_kind {
            return Err(error.unwrap_or_else(|| self.unexpected()));
        }
        Ok(self.advance())
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Fails unless every token has been consumed.
    pub fn expect_end(&self) -> Result<(), Error> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Parses one expression up to a terminator and leaves the stream on it.
    ///
    /// With `allow_to` the identifier `TO` also ends the expression. In
    /// `variable_mode` a variable may carry fewer indices than its
    /// dimension; otherwise missing trailing indices become `0`.
    pub fn parse_expression(
        &mut self,
        terminators: Terminators,
        allow_to: bool,
        variable_mode: bool,
    ) -> Result<Option<Term>, Error> {
        parse_stack_expression(self, terminators, allow_to, variable_mode)
    }

    /// Like `parse_expression`, failing when no expression is present.
    pub fn parse_required(
        &mut self,
        terminators: Terminators,
        allow_to: bool,
        variable_mode: bool,
    ) -> Result<Term, Error> {
        let position = self.get_position();
        self.parse_expression(terminators, allow_to, variable_mode)?
            .ok_or_else(|| Error::new(ErrorImpl::ExpressionExpected, position))
    }
}
