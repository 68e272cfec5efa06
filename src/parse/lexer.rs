use crate::common::{BinaryOperator, OperatorKind};
use logos::{Lexer as LogosLexer, Logos};
use logos_iter::{LogosIter, PeekableLexer};
use std::fmt;

pub type Lexer<'a> = PeekableLexer<'a, LogosLexer<'a, TokenKind>, TokenKind>;

pub fn lexer(s: &str) -> Lexer {
    TokenKind::lexer(s).peekable_lexer()
}

#[derive(Logos, Debug, Copy, Clone, Eq, PartialEq)]
pub enum TokenKind {
    #[regex(r"[0-9]+")]
    Integer,
    #[regex(r"([0-9]+\.[0-9]*)|(\.[0-9]+)")]
    Decimal,
    #[regex(r"([1-9][0-9]*)?d(%|[1-9][0-9]*)")]
    Dice,

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token(",")]
    Comma,

    #[token("+", |_| BinaryOperator::Add)]
    #[token("-", |_| BinaryOperator::Sub)]
    #[token("*", |_| BinaryOperator::Mul)]
    #[token("/", |_| BinaryOperator::Div)]
    #[token("//", |_| BinaryOperator::Flr)]
    #[token("%", |_| BinaryOperator::Rem)]
    #[token("<", |_| BinaryOperator::Lt)]
    #[token(">", |_| BinaryOperator::Gt)]
    #[token("<=", |_| BinaryOperator::Le)]
    #[token(">=", |_| BinaryOperator::Ge)]
    #[token("==", |_| BinaryOperator::Eq)]
    #[token("!=", |_| BinaryOperator::Ne)]
    Binary(BinaryOperator),

    #[token("k", |_| OperatorKind::Keep)]
    #[token("p", |_| OperatorKind::Drop)]
    #[token("rr", |_| OperatorKind::Reroll)]
    #[token("ro", |_| OperatorKind::RerollOnce)]
    #[token("ra", |_| OperatorKind::ExplodeOnce)]
    #[token("e", |_| OperatorKind::Explode)]
    #[token("mi", |_| OperatorKind::Minimum)]
    #[token("ma", |_| OperatorKind::Maximum)]
    Operator(OperatorKind),

    #[token("h")]
    Highest,
    #[token("l")]
    Lowest,

    #[regex(r"\[[^\]]+\]")]
    Annotation,

    // Operators must touch what they modify, so the parser sees whitespace.
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("[]")]
    EmptyAnnotation,
    #[regex(r"0d(%|[0-9]+)")]
    #[regex(r"([1-9][0-9]*)?d0[0-9]*")]
    BadDice,

    #[error]
    Error,
}

impl TokenKind {
    pub const LESS: Self = Self::Binary(BinaryOperator::Lt);
    pub const GREATER: Self = Self::Binary(BinaryOperator::Gt);

    pub fn binary(self) -> Option<BinaryOperator> {
        match self {
            Self::Binary(op) => Some(op),
            _ => None,
        }
    }

    pub fn operator(self) -> Option<OperatorKind> {
        match self {
            Self::Operator(kind) => Some(kind),
            _ => None,
        }
    }

    /// Tokens the lexer produces only for malformed input.
    pub fn is_error(self) -> bool {
        matches!(self, Self::EmptyAnnotation | Self::BadDice | Self::Error)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("<integer>"),
            Self::Decimal => f.write_str("<decimal>"),
            Self::Dice => f.write_str("<dice>"),
            Self::LeftParen => f.write_str("'('"),
            Self::RightParen => f.write_str("')'"),
            Self::Comma => f.write_str("','"),
            Self::Binary(op) => write!(f, "'{}'", op),
            Self::Operator(kind) => write!(f, "{}", kind),
            Self::Highest => f.write_str("'h'"),
            Self::Lowest => f.write_str("'l'"),
            Self::Annotation => f.write_str("<annotation>"),
            Self::Whitespace => f.write_str("<whitespace>"),
            Self::EmptyAnnotation | Self::BadDice | Self::Error => f.write_str("<error>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(s: &str) -> Vec<TokenKind> {
        TokenKind::lexer(s).collect()
    }

    #[test]
    fn test_dice_and_operators() {
        assert_eq!(kinds("1d20"), vec![Dice]);
        assert_eq!(kinds("d%"), vec![Dice]);
        assert_eq!(
            kinds("10d4rol2mi5"),
            vec![
                Dice,
                Operator(OperatorKind::RerollOnce),
                Lowest,
                Integer,
                Operator(OperatorKind::Minimum),
                Integer,
            ]
        );
        assert_eq!(
            kinds("4d6 + 2"),
            vec![Dice, Whitespace, Binary(BinaryOperator::Add), Whitespace, Integer]
        );
    }

    #[test]
    fn test_longest_symbol_wins() {
        assert_eq!(
            kinds("1//2<=3%4"),
            vec![
                Integer,
                Binary(BinaryOperator::Flr),
                Integer,
                Binary(BinaryOperator::Le),
                Integer,
                Binary(BinaryOperator::Rem),
                Integer,
            ]
        );
        assert_eq!(kinds("ra"), vec![Operator(OperatorKind::ExplodeOnce)]);
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(kinds("0d6"), vec![BadDice]);
        assert_eq!(kinds("2d0"), vec![BadDice]);
        assert_eq!(kinds("[]"), vec![EmptyAnnotation]);
        assert_eq!(kinds("1dx")[0], Integer);
        assert!(kinds("$").iter().all(|kind| kind.is_error()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Binary(BinaryOperator::Ne).to_string(), "'!='");
        assert_eq!(Operator(OperatorKind::Keep).to_string(), "'k'");
        assert_eq!(Dice.to_string(), "<dice>");
    }
}
