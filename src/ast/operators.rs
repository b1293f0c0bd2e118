use std::{collections::HashMap, fmt::Display};

use lazy_static::lazy_static;

use crate::lexer::tokens::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCode {
    Plus,
    Minus,
    Mult,
    Div,
    Mod,
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    And,
    Or,
    Xor,
    Nand,
    Nor,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Not,
    LeftShift,
    RightShift,
    Increment,
    Decrement,
    TernaryIf,
    TernaryElse,
}

/// Operator priority, lowest first. Reduction compares these values only.
#[derive(PartialEq, PartialOrd, Eq, Ord, Clone, Copy, Debug)]
pub enum Priority {
    Ternary,
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
    Unary,
}

lazy_static! {
    pub static ref OPERATOR_LOOKUP: HashMap<TokenKind, OperatorCode> = {
        let mut map = HashMap::new();
        map.insert(TokenKind::Plus, OperatorCode::Plus);
        map.insert(TokenKind::Dash, OperatorCode::Minus);
        map.insert(TokenKind::Star, OperatorCode::Mult);
        map.insert(TokenKind::Slash, OperatorCode::Div);
        map.insert(TokenKind::Percent, OperatorCode::Mod);
        map.insert(TokenKind::Equals, OperatorCode::Equal);
        map.insert(TokenKind::NotEquals, OperatorCode::NotEqual);
        map.insert(TokenKind::Greater, OperatorCode::Greater);
        map.insert(TokenKind::Less, OperatorCode::Less);
        map.insert(TokenKind::GreaterEquals, OperatorCode::GreaterEqual);
        map.insert(TokenKind::LessEquals, OperatorCode::LessEqual);
        map.insert(TokenKind::And, OperatorCode::And);
        map.insert(TokenKind::Or, OperatorCode::Or);
        map.insert(TokenKind::Xor, OperatorCode::Xor);
        map.insert(TokenKind::Nand, OperatorCode::Nand);
        map.insert(TokenKind::Nor, OperatorCode::Nor);
        map.insert(TokenKind::BitAnd, OperatorCode::BitAnd);
        map.insert(TokenKind::BitOr, OperatorCode::BitOr);
        map.insert(TokenKind::BitXor, OperatorCode::BitXor);
        map.insert(TokenKind::Tilde, OperatorCode::BitNot);
        map.insert(TokenKind::Not, OperatorCode::Not);
        map.insert(TokenKind::ShiftLeft, OperatorCode::LeftShift);
        map.insert(TokenKind::ShiftRight, OperatorCode::RightShift);
        map.insert(TokenKind::PlusPlus, OperatorCode::Increment);
        map.insert(TokenKind::MinusMinus, OperatorCode::Decrement);
        map.insert(TokenKind::Question, OperatorCode::TernaryIf);
        map.insert(TokenKind::Hash, OperatorCode::TernaryElse);
        map
    };

    /// Compound assignment tokens to the binary operator they apply.
    pub static ref COMPOUND_ASSIGNMENT_LOOKUP: HashMap<TokenKind, OperatorCode> = {
        let mut map = HashMap::new();
        map.insert(TokenKind::PlusEquals, OperatorCode::Plus);
        map.insert(TokenKind::MinusEquals, OperatorCode::Minus);
        map.insert(TokenKind::StarEquals, OperatorCode::Mult);
        map.insert(TokenKind::SlashEquals, OperatorCode::Div);
        map.insert(TokenKind::PercentEquals, OperatorCode::Mod);
        map.insert(TokenKind::BitAndEquals, OperatorCode::BitAnd);
        map.insert(TokenKind::BitOrEquals, OperatorCode::BitOr);
        map.insert(TokenKind::BitXorEquals, OperatorCode::BitXor);
        map
    };
}

impl OperatorCode {
    pub fn from_token_kind(kind: TokenKind) -> Option<OperatorCode> {
        OPERATOR_LOOKUP.get(&kind).copied()
    }

    pub fn is_prefix(&self) -> bool {
        matches!(
            self,
            OperatorCode::Plus
                | OperatorCode::Minus
                | OperatorCode::Not
                | OperatorCode::BitNot
                | OperatorCode::Increment
                | OperatorCode::Decrement
        )
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, OperatorCode::Increment | OperatorCode::Decrement)
    }

    pub fn is_ternary(&self) -> bool {
        matches!(self, OperatorCode::TernaryIf | OperatorCode::TernaryElse)
    }

    pub fn is_binary(&self) -> bool {
        !matches!(
            self,
            OperatorCode::Not
                | OperatorCode::BitNot
                | OperatorCode::Increment
                | OperatorCode::Decrement
                | OperatorCode::TernaryIf
                | OperatorCode::TernaryElse
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            OperatorCode::Equal
                | OperatorCode::NotEqual
                | OperatorCode::Greater
                | OperatorCode::Less
                | OperatorCode::GreaterEqual
                | OperatorCode::LessEqual
        )
    }

    /// Priority as a binary or ternary operator.
    pub fn priority(&self) -> Priority {
        match self {
            OperatorCode::TernaryIf | OperatorCode::TernaryElse => Priority::Ternary,
            OperatorCode::Or | OperatorCode::Xor | OperatorCode::Nor => Priority::LogicalOr,
            OperatorCode::And | OperatorCode::Nand => Priority::LogicalAnd,
            OperatorCode::BitOr => Priority::BitOr,
            OperatorCode::BitXor => Priority::BitXor,
            OperatorCode::BitAnd => Priority::BitAnd,
            OperatorCode::Equal | OperatorCode::NotEqual => Priority::Equality,
            OperatorCode::Greater
            | OperatorCode::Less
            | OperatorCode::GreaterEqual
            | OperatorCode::LessEqual => Priority::Relational,
            OperatorCode::LeftShift | OperatorCode::RightShift => Priority::Shift,
            OperatorCode::Plus | OperatorCode::Minus => Priority::Additive,
            OperatorCode::Mult | OperatorCode::Div | OperatorCode::Mod => Priority::Multiplicative,
            OperatorCode::Not
            | OperatorCode::BitNot
            | OperatorCode::Increment
            | OperatorCode::Decrement => Priority::Unary,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            OperatorCode::Plus => "+",
            OperatorCode::Minus => "-",
            OperatorCode::Mult => "*",
            OperatorCode::Div => "/",
            OperatorCode::Mod => "%",
            OperatorCode::Equal => "==",
            OperatorCode::NotEqual => "!=",
            OperatorCode::Greater => ">",
            OperatorCode::Less => "<",
            OperatorCode::GreaterEqual => ">=",
            OperatorCode::LessEqual => "<=",
            OperatorCode::And => "&&",
            OperatorCode::Or => "||",
            OperatorCode::Xor => "^^",
            OperatorCode::Nand => "!&",
            OperatorCode::Nor => "!|",
            OperatorCode::BitAnd => "&",
            OperatorCode::BitOr => "|",
            OperatorCode::BitXor => "^",
            OperatorCode::BitNot => "~",
            OperatorCode::Not => "!",
            OperatorCode::LeftShift => "<<",
            OperatorCode::RightShift => ">>",
            OperatorCode::Increment => "++",
            OperatorCode::Decrement => "--",
            OperatorCode::TernaryIf => "?",
            OperatorCode::TernaryElse => "#",
        }
    }
}

impl Display for OperatorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOperator {
    pub fn prefix(op: OperatorCode) -> Option<UnaryOperator> {
        match op {
            OperatorCode::Plus => Some(UnaryOperator::Plus),
            OperatorCode::Minus => Some(UnaryOperator::Minus),
            OperatorCode::Not => Some(UnaryOperator::Not),
            OperatorCode::BitNot => Some(UnaryOperator::BitNot),
            OperatorCode::Increment => Some(UnaryOperator::PreIncrement),
            OperatorCode::Decrement => Some(UnaryOperator::PreDecrement),
            _ => None,
        }
    }

    pub fn postfix(op: OperatorCode) -> Option<UnaryOperator> {
        match op {
            OperatorCode::Increment => Some(UnaryOperator::PostIncrement),
            OperatorCode::Decrement => Some(UnaryOperator::PostDecrement),
            _ => None,
        }
    }

    pub fn is_increment(&self) -> bool {
        matches!(
            self,
            UnaryOperator::PreIncrement
                | UnaryOperator::PreDecrement
                | UnaryOperator::PostIncrement
                | UnaryOperator::PostDecrement
        )
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOperator::PostIncrement | UnaryOperator::PostDecrement)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
            UnaryOperator::PreIncrement | UnaryOperator::PostIncrement => "++",
            UnaryOperator::PreDecrement | UnaryOperator::PostDecrement => "--",
        }
    }
}
