//! Operator-precedence stack machine.
//!
//! Operands and operators are pushed as they are read. A binary operator
//! first reduces every pending operator of equal or higher priority, which
//! makes binary operators left associative. `?` and `#` have the lowest
//! priority and group to the right.

use crate::{
    ast::{
        operators::{OperatorCode, Priority, UnaryOperator},
        terms::Term,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Position,
};

use super::{
    expr::parse_operand,
    parser::{Parser, Terminators},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// A value or a prefix operator.
    Value,
    /// A binary or postfix operator, or the end.
    Operator,
    /// A value after `+`, `-`, `!` or `~`; the prefix applies to it at once.
    AfterSign,
    /// A value after prefix `++` or `--`; the prefix applies at the next
    /// binary operator or at the end.
    AfterIncrement,
}

#[derive(Debug)]
enum StackItem {
    Operand(Term),
    Prefix(UnaryOperator, Position),
    Operator(OperatorCode, Position),
}

struct ExpressionStack {
    items: Vec<StackItem>,
    state: State,
    ternary_depth: i32,
    last_operator: Option<OperatorCode>,
    start: Position,
}

pub(super) fn parse_stack_expression(
    parser: &mut Parser,
    terminators: Terminators,
    allow_to: bool,
    variable_mode: bool,
) -> Result<Option<Term>, Error> {
    let mut stack = ExpressionStack::new(parser.get_position());

    loop {
        let token = parser.current_token().clone();
        let position = token.span.start.clone();

        if token.kind == TokenKind::MacroMarker {
            return Err(Error::new(ErrorImpl::MacroMarkerReached, position));
        }
        if token.kind == TokenKind::EOF || terminators.matches(token.kind) {
            break;
        }
        if allow_to && parser.at_word("TO") {
            break;
        }
        if token.kind.is_assignment() {
            return Err(Error::new(ErrorImpl::AssignmentInExpression, position));
        }
        if token.kind == TokenKind::Hash {
            stack.ternary_depth -= 1;
            if stack.ternary_depth < 0 {
                return Err(Error::new(ErrorImpl::TernaryCloseWithoutOpen, position));
            }
        }

        if stack.state != State::Operator {
            if !token.kind.is_operator() {
                let operand = parse_operand(parser, variable_mode)?;
                stack.push_operand(operand)?;
                continue;
            }
            if stack.state != State::Value {
                return Err(parser.unexpected());
            }

            let prefix = OperatorCode::from_token_kind(token.kind)
                .filter(|op| op.is_prefix())
                .and_then(UnaryOperator::prefix);
            let Some(prefix) = prefix else {
                return Err(Error::new(ErrorImpl::InvalidUnaryOperator { operator: token.value }, position));
            };
            parser.advance();
            stack.items.push(StackItem::Prefix(prefix, position));
            stack.state = if prefix.is_increment() { State::AfterIncrement } else { State::AfterSign };
            continue;
        }

        let Some(operator) = OperatorCode::from_token_kind(token.kind) else {
            return Err(parser.unexpected());
        };
        parser.advance();

        match operator {
            OperatorCode::Increment | OperatorCode::Decrement => {
                stack.apply_postfix(operator, position)?;
            }
            OperatorCode::TernaryIf => {
                stack.reduce_while(|_| true)?;
                stack.items.push(StackItem::Operator(operator, position));
                stack.ternary_depth += 1;
                stack.last_operator = None;
                stack.state = State::Value;
            }
            OperatorCode::TernaryElse => {
                stack.reduce_else()?;
                stack.items.push(StackItem::Operator(operator, position));
                stack.last_operator = None;
                stack.state = State::Value;
            }
            _ if operator.is_binary() => {
                if operator.is_comparison() && stack.last_operator.is_some_and(|op| op.is_comparison()) {
                    parser.context_mut().warn(
                        format!("comparison `{}` applied to the result of another comparison", operator),
                        position.clone(),
                    );
                }
                stack.reduce_while(|pending| pending.priority() >= operator.priority())?;
                stack.items.push(StackItem::Operator(operator, position));
                stack.last_operator = Some(operator);
                stack.state = State::Value;
            }
            _ => {
                return Err(Error::new(ErrorImpl::UnexpectedToken { token: token.value }, position));
            }
        }
    }

    let end = parser.get_position();
    stack.finish(end)
}

impl ExpressionStack {
    fn new(start: Position) -> Self {
        ExpressionStack {
            items: vec![],
            state: State::Value,
            ternary_depth: 0,
            last_operator: None,
            start,
        }
    }

    fn push_operand(&mut self, operand: Term) -> Result<(), Error> {
        let previous = self.state;
        self.items.push(StackItem::Operand(operand));
        self.state = State::Operator;

        if previous == State::AfterSign {
            self.reduce_top()?;
        }
        Ok(())
    }

    /// The item directly below the top operand.
    fn pending(&self) -> Option<&StackItem> {
        let len = self.items.len();
        if len < 2 {
            return None;
        }
        self.items.get(len - 2)
    }

    /// Reduces prefixes and non-ternary operators accepted by `reduce`.
    fn reduce_while(&mut self, reduce: impl Fn(OperatorCode) -> bool) -> Result<(), Error> {
        loop {
            match self.pending() {
                Some(StackItem::Prefix(..)) => self.reduce_top()?,
                Some(StackItem::Operator(op, _)) if !op.is_ternary() && reduce(*op) => self.reduce_top()?,
                _ => return Ok(()),
            }
        }
    }

    // A `#` closes every complete ternary above the nearest open `?`.
    fn reduce_else(&mut self) -> Result<(), Error> {
        loop {
            self.reduce_while(|pending| pending.priority() > Priority::Ternary)?;
            match self.pending() {
                Some(StackItem::Operator(OperatorCode::TernaryElse, _)) => self.reduce_top()?,
                _ => return Ok(()),
            }
        }
    }

    fn reduce_top(&mut self) -> Result<(), Error> {
        let Some(StackItem::Operand(right)) = self.items.pop() else {
            return Err(self.underflow());
        };

        let term = match self.items.pop() {
            Some(StackItem::Prefix(operator, position)) => {
                Term::unary(operator, right).map_err(|e| Error::new(e, position))?
            }
            Some(StackItem::Operator(OperatorCode::TernaryElse, position)) => {
                let insufficient = || Error::new(ErrorImpl::InsufficientTernaryOperands, position.clone());
                let Some(StackItem::Operand(middle)) = self.items.pop() else {
                    return Err(insufficient());
                };
                let Some(StackItem::Operator(OperatorCode::TernaryIf, _)) = self.items.pop() else {
                    return Err(insufficient());
                };
                let Some(StackItem::Operand(left)) = self.items.pop() else {
                    return Err(insufficient());
                };
                Term::ternary(left, middle, right).map_err(|e| Error::new(e, position.clone()))?
            }
            Some(StackItem::Operator(OperatorCode::TernaryIf, position)) => {
                return Err(Error::new(ErrorImpl::InsufficientTernaryOperands, position));
            }
            Some(StackItem::Operator(operator, position)) => {
                let Some(StackItem::Operand(left)) = self.items.pop() else {
                    return Err(self.underflow());
                };
                Term::binary(operator, left, right).map_err(|e| Error::new(e, position))?
            }
            _ => return Err(self.underflow()),
        };

        self.items.push(StackItem::Operand(term));
        Ok(())
    }

    fn apply_postfix(&mut self, operator: OperatorCode, position: Position) -> Result<(), Error> {
        let Some(postfix) = UnaryOperator::postfix(operator) else {
            return Err(Error::new(ErrorImpl::InvalidUnaryOperator { operator: operator.to_string() }, position));
        };
        if let Some(StackItem::Prefix(prefix, _)) = self.pending() {
            if prefix.is_increment() {
                return Err(Error::new(ErrorImpl::PrefixAndPostfixIncrement, position));
            }
        }

        let operand = match self.items.pop() {
            Some(StackItem::Operand(Term::Unary { operator, .. })) if operator.is_postfix() => {
                return Err(Error::new(ErrorImpl::DuplicatePostfixOperator, position));
            }
            Some(StackItem::Operand(operand)) => operand,
            _ => return Err(self.underflow()),
        };
        let term = Term::unary(postfix, operand).map_err(|e| Error::new(e, position))?;
        self.items.push(StackItem::Operand(term));
        Ok(())
    }

    fn finish(mut self, end: Position) -> Result<Option<Term>, Error> {
        if self.items.is_empty() {
            return Ok(None);
        }
        if self.state != State::Operator {
            return Err(Error::new(ErrorImpl::ExpressionExpected, end));
        }
        if self.ternary_depth != 0 {
            return Err(Error::new(ErrorImpl::UnbalancedTernary, end));
        }

        while self.items.len() > 1 {
            self.reduce_top()?;
        }
        match self.items.pop() {
            Some(StackItem::Operand(term)) => Ok(Some(term)),
            _ => Err(self.underflow()),
        }
    }

    fn underflow(&self) -> Error {
        Error::new(
            ErrorImpl::InternalInvariant { message: String::from("expression stack underflow") },
            self.start.clone(),
        )
    }
}
