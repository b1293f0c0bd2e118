use std::fmt::Display;

use crate::Span;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    String,
    FormattedString,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,
    Colon,
    At,

    Assignment,       // =
    StringAssignment, // '=
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    PercentEquals,
    BitAndEquals,
    BitOrEquals,
    BitXorEquals,

    Equals,    // ==
    NotEquals, // !=
    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    And,  // &&
    Or,   // ||
    Xor,  // ^^
    Nand, // !&
    Nor,  // !|
    Not,  // !

    BitAnd,
    BitOr,
    BitXor,
    Tilde,
    ShiftLeft,
    ShiftRight,

    PlusPlus,
    MinusMinus,

    Plus,
    Dash,
    Star,
    Slash,
    Percent,

    Question,
    Hash,

    // Never produced by the lexer. The parser rejects it as an internal invariant violation.
    MacroMarker,
}

impl TokenKind {
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::NotEquals
                | TokenKind::Less
                | TokenKind::LessEquals
                | TokenKind::Greater
                | TokenKind::GreaterEquals
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Xor
                | TokenKind::Nand
                | TokenKind::Nor
                | TokenKind::Not
                | TokenKind::BitAnd
                | TokenKind::BitOr
                | TokenKind::BitXor
                | TokenKind::Tilde
                | TokenKind::ShiftLeft
                | TokenKind::ShiftRight
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::Plus
                | TokenKind::Dash
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Question
                | TokenKind::Hash
        )
    }

    /// `=` and every compound assignment.
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::Assignment
                | TokenKind::StringAssignment
                | TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::SlashEquals
                | TokenKind::PercentEquals
                | TokenKind::BitAndEquals
                | TokenKind::BitOrEquals
                | TokenKind::BitXorEquals
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::EOF => write!(f, "end of line"),
            TokenKind::String => write!(f, "\"{}\"", self.value),
            _ => write!(f, "{}", self.value),
        }
    }
}

impl Token {
    /// True for an identifier token spelling `word`, honouring case folding.
    pub fn is_word(&self, word: &str, case_insensitive: bool) -> bool {
        if self.kind != TokenKind::Identifier {
            return false;
        }
        if case_insensitive {
            self.value.eq_ignore_ascii_case(word)
        } else {
            self.value == word
        }
    }
}
