use crate::{
    ast::terms::{Term, VariableTerm},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::parser::{Parser, Terminators};

/// One parameter of a label definition: `ARG:1 = 10`.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionArgument {
    pub target: VariableTerm,
    pub default: Term,
}

fn closing_terminator(closing: TokenKind) -> Terminators {
    match closing {
        TokenKind::CloseParen => Terminators::RIGHT_PAREN,
        TokenKind::CloseBracket => Terminators::RIGHT_BRACKET,
        _ => Terminators::EOL,
    }
}

/// Moves past the separator after an argument. Returns true at the closer.
fn finish_argument(parser: &mut Parser, closing: TokenKind) -> Result<bool, Error> {
    match parser.current_token_kind() {
        TokenKind::Comma => {
            parser.advance();
            Ok(false)
        }
        kind if kind == closing => {
            if closing != TokenKind::EOF {
                parser.advance();
            }
            Ok(true)
        }
        TokenKind::EOF => Err(parser.error(ErrorImpl::UnmatchedParenthesis)),
        _ => Err(parser.unexpected()),
    }
}

/// Comma separated call arguments up to `closing` (`)`, `]` or the end of
/// the line). The opener has already been consumed; a closing bracket is
/// consumed too. Empty slots are kept as `None`.
pub fn parse_arguments(parser: &mut Parser, closing: TokenKind) -> Result<Vec<Option<Term>>, Error> {
    let terminators = Terminators::COMMA | closing_terminator(closing);
    let mut arguments = vec![];

    if parser.current_token_kind() == closing {
        if closing != TokenKind::EOF {
            parser.advance();
        }
        return Ok(arguments);
    }

    loop {
        arguments.push(parser.parse_expression(terminators, false, false)?);
        if finish_argument(parser, closing)? {
            return Ok(arguments);
        }
    }
}

/// Parameter list of a label: `target [= default]` items. A default must
/// have the target's type; a missing default is `0` or `""`.
pub fn parse_definition_arguments(
    parser: &mut Parser,
    closing: TokenKind,
) -> Result<Vec<DefinitionArgument>, Error> {
    let terminators = Terminators::COMMA | Terminators::ASSIGNMENT | closing_terminator(closing);
    let mut arguments = vec![];

    if parser.current_token_kind() == closing {
        if closing != TokenKind::EOF {
            parser.advance();
        }
        return Ok(arguments);
    }

    loop {
        let position = parser.get_position();
        let target = match parser.parse_required(terminators, false, false)? {
            Term::Variable(variable) => variable,
            other => {
                return Err(Error::new(ErrorImpl::NotAVariable { name: other.to_string() }, position))
            }
        };
        if !target.descriptor.is_writable() {
            return Err(Error::new(ErrorImpl::VariableNotWritable { variable: target.name }, position));
        }

        let default = match parser.current_token_kind() {
            TokenKind::Assignment => {
                parser.advance();
                let default_position = parser.get_position();
                let value = parser.parse_required(Terminators::COMMA | closing_terminator(closing), false, false)?;
                let value = value.restructure();
                if value.result_type() != target.descriptor.value_type() {
                    return Err(Error::new(
                        ErrorImpl::TypeMatchError {
                            expected: target.descriptor.value_type().to_string(),
                            received: value.result_type().to_string(),
                        },
                        default_position,
                    ));
                }
                value
            }
            kind if kind.is_assignment() => return Err(parser.unexpected()),
            _ => Term::zero(target.descriptor.value_type()),
        };

        arguments.push(DefinitionArgument { target, default });
        if finish_argument(parser, closing)? {
            return Ok(arguments);
        }
    }
}
