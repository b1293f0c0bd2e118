//! Operand terms.
//!
//! A term is one node of an expression tree. Every term has a static result
//! type fixed at construction; the checked constructors (`unary`, `binary`,
//! `ternary`) refuse operand combinations that have no meaning.

use std::fmt::Display;

use crate::{
    errors::errors::ErrorImpl,
    variables::{builtins::VariableCode, descriptor::{ValueType, VariableDescriptor}},
};

use super::operators::{OperatorCode, UnaryOperator};

#[derive(Debug, Clone, PartialEq)]
pub enum VariableTarget {
    Builtin(VariableCode),
    /// A `#DIM` declared in a header file.
    Global(String),
    /// A `#DIM` declared inside a label body.
    Private { label: String, name: String },
    /// A label-scoped slot (`LOCAL@LABEL`).
    Local { code: VariableCode, subkey: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableTerm {
    pub name: String,
    pub target: VariableTarget,
    pub descriptor: VariableDescriptor,
    /// Explicit character index; `None` means the implicit target.
    pub character: Option<Box<Term>>,
    pub indices: Vec<Term>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    Builtin,
    UserFunction,
    RefMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallTerm {
    pub name: String,
    pub target: CallTarget,
    pub arguments: Vec<Option<Term>>,
    pub return_type: ValueType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormatPart {
    Text(String),
    Expression {
        term: Term,
        width: Option<Term>,
        alignment: Alignment,
    },
    Conditional {
        condition: Term,
        then_branch: FormattedString,
        else_branch: FormattedString,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormattedString {
    pub parts: Vec<FormatPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Integer(i64),
    String(String),
    Formatted(FormattedString),
    Variable(VariableTerm),
    Call(CallTerm),
    Unary {
        operator: UnaryOperator,
        operand: Box<Term>,
    },
    Binary {
        operator: OperatorCode,
        left: Box<Term>,
        right: Box<Term>,
    },
    Ternary {
        condition: Box<Term>,
        then_branch: Box<Term>,
        else_branch: Box<Term>,
    },
}

impl Term {
    pub fn zero(value_type: ValueType) -> Term {
        match value_type {
            ValueType::Integer => Term::Integer(0),
            ValueType::String => Term::String(String::new()),
        }
    }

    pub fn result_type(&self) -> ValueType {
        match self {
            Term::Integer(_) => ValueType::Integer,
            Term::String(_) | Term::Formatted(_) => ValueType::String,
            Term::Variable(variable) => variable.descriptor.value_type(),
            Term::Call(call) => call.return_type,
            Term::Unary { .. } => ValueType::Integer,
            Term::Binary { operator, left, .. } => match operator {
                OperatorCode::Plus | OperatorCode::Mult => left.result_type(),
                _ => ValueType::Integer,
            },
            Term::Ternary { then_branch, .. } => then_branch.result_type(),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Integer(_) | Term::String(_))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Term::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableTerm> {
        match self {
            Term::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    pub fn unary(operator: UnaryOperator, operand: Term) -> Result<Term, ErrorImpl> {
        if operator.is_increment() {
            let writable_int = operand.as_variable().is_some_and(|v| {
                v.descriptor.is_writable() && v.descriptor.value_type() == ValueType::Integer
            });
            if !writable_int {
                return Err(ErrorImpl::InvalidIncrementTarget);
            }
        } else if operand.result_type() != ValueType::Integer {
            return Err(ErrorImpl::TypeMatchError {
                expected: ValueType::Integer.to_string(),
                received: operand.result_type().to_string(),
            });
        }

        Ok(Term::Unary { operator, operand: Box::new(operand) })
    }

    pub fn binary(operator: OperatorCode, left: Term, right: Term) -> Result<Term, ErrorImpl> {
        let (lhs, rhs) = (left.result_type(), right.result_type());
        let valid = match operator {
            OperatorCode::Plus => lhs == rhs,
            OperatorCode::Mult => rhs == ValueType::Integer,
            _ if operator.is_comparison() => lhs == rhs,
            _ if operator.is_binary() => lhs == ValueType::Integer && rhs == ValueType::Integer,
            _ => false,
        };

        if !valid {
            return Err(ErrorImpl::OperandTypeMismatch {
                operator: operator.symbol().to_string(),
                left: lhs.to_string(),
                right: rhs.to_string(),
            });
        }

        Ok(Term::Binary { operator, left: Box::new(left), right: Box::new(right) })
    }

    pub fn ternary(condition: Term, then_branch: Term, else_branch: Term) -> Result<Term, ErrorImpl> {
        if condition.result_type() != ValueType::Integer {
            return Err(ErrorImpl::TypeMatchError {
                expected: ValueType::Integer.to_string(),
                received: condition.result_type().to_string(),
            });
        }
        if then_branch.result_type() != else_branch.result_type() {
            return Err(ErrorImpl::OperandTypeMismatch {
                operator: String::from("?#"),
                left: then_branch.result_type().to_string(),
                right: else_branch.result_type().to_string(),
            });
        }

        Ok(Term::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    /// Folds constant sub-trees into literals. Folding a folded term is a no-op.
    pub fn restructure(self) -> Term {
        match self {
            Term::Integer(_) | Term::String(_) => self,
            Term::Formatted(formatted) => formatted.restructure(),
            Term::Variable(mut variable) => {
                variable.character = variable.character.map(|c| Box::new(c.restructure()));
                variable.indices = variable.indices.into_iter().map(Term::restructure).collect();
                Term::Variable(variable)
            }
            Term::Call(mut call) => {
                call.arguments = call
                    .arguments
                    .into_iter()
                    .map(|argument| argument.map(Term::restructure))
                    .collect();
                Term::Call(call)
            }
            Term::Unary { operator, operand } => {
                let operand = operand.restructure();
                match (operator, operand.as_integer()) {
                    (UnaryOperator::Plus, Some(value)) => Term::Integer(value),
                    (UnaryOperator::Minus, Some(value)) => Term::Integer(value.wrapping_neg()),
                    (UnaryOperator::Not, Some(value)) => Term::Integer((value == 0) as i64),
                    (UnaryOperator::BitNot, Some(value)) => Term::Integer(!value),
                    _ => Term::Unary { operator, operand: Box::new(operand) },
                }
            }
            Term::Binary { operator, left, right } => {
                let left = left.restructure();
                let right = right.restructure();
                match fold_binary(operator, &left, &right) {
                    Some(folded) => folded,
                    None => Term::Binary { operator, left: Box::new(left), right: Box::new(right) },
                }
            }
            Term::Ternary { condition, then_branch, else_branch } => {
                let condition = condition.restructure();
                let then_branch = then_branch.restructure();
                let else_branch = else_branch.restructure();
                match condition.as_integer() {
                    Some(0) => else_branch,
                    Some(_) => then_branch,
                    None => Term::Ternary {
                        condition: Box::new(condition),
                        then_branch: Box::new(then_branch),
                        else_branch: Box::new(else_branch),
                    },
                }
            }
        }
    }
}

// Longer repetitions stay unfolded and are left to the runtime.
const MAX_FOLDED_STRING_LEN: usize = 1 << 16;

fn fold_binary(operator: OperatorCode, left: &Term, right: &Term) -> Option<Term> {
    match (left, right) {
        (Term::Integer(l), Term::Integer(r)) => fold_integers(operator, *l, *r).map(Term::Integer),
        (Term::String(l), Term::String(r)) => match operator {
            OperatorCode::Plus => Some(Term::String(format!("{}{}", l, r))),
            OperatorCode::Equal => Some(Term::Integer((l == r) as i64)),
            OperatorCode::NotEqual => Some(Term::Integer((l != r) as i64)),
            OperatorCode::Greater => Some(Term::Integer((l > r) as i64)),
            OperatorCode::Less => Some(Term::Integer((l < r) as i64)),
            OperatorCode::GreaterEqual => Some(Term::Integer((l >= r) as i64)),
            OperatorCode::LessEqual => Some(Term::Integer((l <= r) as i64)),
            _ => None,
        },
        (Term::String(l), Term::Integer(count)) if operator == OperatorCode::Mult => usize::try_from(*count)
            .ok()
            .filter(|&count| l.len().checked_mul(count).is_some_and(|len| len <= MAX_FOLDED_STRING_LEN))
            .map(|count| Term::String(l.repeat(count))),
        _ => None,
    }
}

// Division by zero and out-of-range shifts stay unfolded so the runtime reports them.
fn fold_integers(operator: OperatorCode, l: i64, r: i64) -> Option<i64> {
    let truth = |value: bool| value as i64;
    match operator {
        OperatorCode::Plus => Some(l.wrapping_add(r)),
        OperatorCode::Minus => Some(l.wrapping_sub(r)),
        OperatorCode::Mult => Some(l.wrapping_mul(r)),
        OperatorCode::Div => l.checked_div(r),
        OperatorCode::Mod => l.checked_rem(r),
        OperatorCode::Equal => Some(truth(l == r)),
        OperatorCode::NotEqual => Some(truth(l != r)),
        OperatorCode::Greater => Some(truth(l > r)),
        OperatorCode::Less => Some(truth(l < r)),
        OperatorCode::GreaterEqual => Some(truth(l >= r)),
        OperatorCode::LessEqual => Some(truth(l <= r)),
        OperatorCode::And => Some(truth(l != 0 && r != 0)),
        OperatorCode::Or => Some(truth(l != 0 || r != 0)),
        OperatorCode::Xor => Some(truth((l != 0) ^ (r != 0))),
        OperatorCode::Nand => Some(truth(!(l != 0 && r != 0))),
        OperatorCode::Nor => Some(truth(!(l != 0 || r != 0))),
        OperatorCode::BitAnd => Some(l & r),
        OperatorCode::BitOr => Some(l | r),
        OperatorCode::BitXor => Some(l ^ r),
        OperatorCode::LeftShift => u32::try_from(r).ok().and_then(|r| l.checked_shl(r)),
        OperatorCode::RightShift => u32::try_from(r).ok().and_then(|r| l.checked_shr(r)),
        _ => None,
    }
}

impl FormattedString {
    pub fn text(text: impl Into<String>) -> Self {
        FormattedString { parts: vec![FormatPart::Text(text.into())] }
    }

    /// Folds every part; a template made only of text becomes a string literal.
    pub fn restructure(self) -> Term {
        let folded = self.fold_parts();
        match folded.as_text() {
            Some(text) => Term::String(text),
            None => Term::Formatted(folded),
        }
    }

    fn fold_parts(self) -> FormattedString {
        let mut parts: Vec<FormatPart> = vec![];

        for part in self.parts {
            let part = match part {
                FormatPart::Expression { term, width, alignment } => {
                    let term = term.restructure();
                    let width = width.map(Term::restructure);
                    let literal = match (&term, &width) {
                        (Term::Integer(value), None) => Some(value.to_string()),
                        (Term::String(value), None) => Some(value.clone()),
                        _ => None,
                    };
                    match literal {
                        Some(text) => FormatPart::Text(text),
                        None => FormatPart::Expression { term, width, alignment },
                    }
                }
                FormatPart::Conditional { condition, then_branch, else_branch } => {
                    let condition = condition.restructure();
                    let then_branch = then_branch.fold_parts();
                    let else_branch = else_branch.fold_parts();
                    match condition.as_integer() {
                        Some(0) => {
                            push_parts(&mut parts, else_branch.parts);
                            continue;
                        }
                        Some(_) => {
                            push_parts(&mut parts, then_branch.parts);
                            continue;
                        }
                        None => FormatPart::Conditional { condition, then_branch, else_branch },
                    }
                }
                text => text,
            };
            push_parts(&mut parts, vec![part]);
        }

        FormattedString { parts }
    }

    fn as_text(&self) -> Option<String> {
        let mut text = String::new();
        for part in &self.parts {
            match part {
                FormatPart::Text(value) => text.push_str(value),
                _ => return None,
            }
        }
        Some(text)
    }
}

// Adjacent text parts are merged so folding twice yields the same parts.
fn push_parts(parts: &mut Vec<FormatPart>, incoming: Vec<FormatPart>) {
    for part in incoming {
        if let (Some(FormatPart::Text(last)), FormatPart::Text(next)) = (parts.last_mut(), &part) {
            last.push_str(next);
            continue;
        }
        parts.push(part);
    }
}

impl Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for part in &self.parts {
            match part {
                FormatPart::Text(text) => write!(f, "{}", text)?,
                FormatPart::Expression { term, width, alignment } => {
                    let (open, close) = match term.result_type() {
                        ValueType::Integer => ("{", "}"),
                        ValueType::String => ("%", "%"),
                    };
                    write!(f, "{}{}", open, term)?;
                    if let Some(width) = width {
                        write!(f, ", {}", width)?;
                        if *alignment == Alignment::Left {
                            write!(f, ", LEFT")?;
                        }
                    }
                    write!(f, "{}", close)?;
                }
                FormatPart::Conditional { condition, then_branch, else_branch } => {
                    write!(f, "\\@{} ? {} # {}\\@", condition, then_branch, else_branch)?
                }
            }
        }
        Ok(())
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Integer(value) => write!(f, "{}", value),
            Term::String(value) => write!(f, "{:?}", value),
            Term::Formatted(formatted) => write!(f, "@\"{}\"", formatted),
            Term::Variable(variable) => {
                write!(f, "{}", variable.name)?;
                if let VariableTarget::Local { subkey, .. } = &variable.target {
                    write!(f, "@{}", subkey)?;
                }
                if let Some(character) = &variable.character {
                    write!(f, ":{}", character)?;
                }
                for index in &variable.indices {
                    write!(f, ":{}", index)?;
                }
                Ok(())
            }
            Term::Call(call) => {
                write!(f, "{}(", call.name)?;
                for (i, argument) in call.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(argument) = argument {
                        write!(f, "{}", argument)?;
                    }
                }
                write!(f, ")")
            }
            Term::Unary { operator, operand } if operator.is_postfix() => {
                write!(f, "({}{})", operand, operator.symbol())
            }
            Term::Unary { operator, operand } => write!(f, "({}{})", operator.symbol(), operand),
            Term::Binary { operator, left, right } => write!(f, "({} {} {})", left, operator, right),
            Term::Ternary { condition, then_branch, else_branch } => {
                write!(f, "({} ? {} # {})", condition, then_branch, else_branch)
            }
        }
    }
}
