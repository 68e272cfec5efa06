use super::lexer::TokenKind;
use crate::common::{OperatorKind, Selector};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Raised when a string is not valid dice notation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("error at position {} ({slice:?}): {kind}", .span.start)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub slice: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken {
        found: Option<TokenKind>,
        expected: Vec<TokenKind>,
    },
    UnexpectedString {
        expected: Vec<TokenKind>,
    },
    LexError(TokenKind),
    TrailingInput,
    InvalidNumber,
    InvalidMinMaxSelector(Selector),
    InvalidSetOp(OperatorKind),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken { found, expected } => {
                match found {
                    Some(found) => write!(f, "unexpected token: found {}, expected ", found)?,
                    None => f.write_str("unexpected end of input, expected ")?,
                }
                write!(f, "{}", ExpectedList(expected))
            }
            Self::UnexpectedString { expected } => {
                write!(f, "expected {}", ExpectedList(expected))
            }
            Self::LexError(TokenKind::BadDice) => f.write_str("invalid dice literal"),
            Self::LexError(TokenKind::EmptyAnnotation) => {
                f.write_str("annotations cannot be empty")
            }
            Self::LexError(_) => f.write_str("unrecognized input"),
            Self::TrailingInput => f.write_str("unexpected input after the expression"),
            Self::InvalidNumber => f.write_str("number is out of range"),
            Self::InvalidMinMaxSelector(sel) => write!(
                f,
                "selector '{}' cannot follow 'mi' or 'ma'; only a number is allowed",
                sel
            ),
            Self::InvalidSetOp(kind) => write!(f, "{} can only be used with dice", kind),
        }
    }
}

/// `a`, `a or b`, `a, b, or c`.
struct ExpectedList<'a>(&'a [TokenKind]);

impl fmt::Display for ExpectedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [] => f.write_str("nothing"),
            [only] => write!(f, "{}", only),
            [a, b] => write!(f, "{} or {}", a, b),
            [init @ .., last] => {
                init.iter().try_for_each(|kind| write!(f, "{}, ", kind))?;
                write!(f, "or {}", last)
            }
        }
    }
}
