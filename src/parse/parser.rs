use super::ast::*;
use super::error::{ParseError, ParseErrorKind};
use super::lexer::*;
use crate::common::*;
use logos_iter::LogosIter;
use std::str::FromStr;

type PResult<'a, T = Node<'a>> = Result<T, ParseError>;

const ATOM_START: &[TokenKind] = &[
    TokenKind::LeftParen,
    TokenKind::Decimal,
    TokenKind::Integer,
    TokenKind::Dice,
];

const SELECTOR_START: &[TokenKind] = &[
    TokenKind::Integer,
    TokenKind::Highest,
    TokenKind::Lowest,
    TokenKind::LESS,
    TokenKind::GREATER,
];

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    allow_comments: bool,
    /// Whitespace was skipped since the last consumed token.
    spaced: bool,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self {
            lexer: lexer(s),
            allow_comments: false,
            spaced: false,
        }
    }

    /// Treat text separated from the expression by whitespace as a comment.
    pub fn with_comments(mut self) -> Self {
        self.allow_comments = true;
        self
    }

    pub fn parse(mut self) -> Result<Expression<'a>, ParseError> {
        let root = self.expression(0)?;
        let comment = self.comment()?;
        Ok(Expression { root, comment })
    }

    /// The next token, which may not be separated by whitespace.
    fn peek_adjacent(&mut self) -> Option<TokenKind> {
        self.lexer.peek().copied()
    }

    fn peek(&mut self) -> Option<TokenKind> {
        while self.lexer.next_if_eq(&TokenKind::Whitespace).is_some() {
            self.spaced = true;
        }
        self.peek_adjacent()
    }

    fn bump(&mut self) -> Option<TokenKind> {
        self.spaced = false;
        self.lexer.next()
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<'a, ()> {
        if self.peek() == Some(kind) {
            self.bump();
            Ok(())
        } else {
            self.unexpected(&[kind])
        }
    }

    fn adjacent_number<T: FromStr>(&mut self) -> PResult<'a, T> {
        if self.peek_adjacent() == Some(TokenKind::Integer) {
            self.bump();
            self.slice_as()
        } else {
            self.unexpected(&[TokenKind::Integer])
        }
    }

    fn slice_as<T: FromStr>(&self) -> PResult<'a, T> {
        self.lexer
            .slice()
            .parse::<T>()
            .or_else(|_| self.fail(ParseErrorKind::InvalidNumber))
    }

    /// An error spanning the last consumed token.
    fn fail<T>(&self, kind: ParseErrorKind) -> PResult<'a, T> {
        Err(ParseError {
            kind,
            span: self.lexer.span(),
            slice: self.lexer.slice().to_string(),
        })
    }

    fn unexpected<T>(&mut self, expected: &[TokenKind]) -> PResult<'a, T> {
        let expected = expected.to_vec();
        match self.bump() {
            None => {
                let end = self.lexer.source().len();
                Err(ParseError {
                    kind: ParseErrorKind::UnexpectedToken {
                        found: None,
                        expected,
                    },
                    span: end..end,
                    slice: String::new(),
                })
            }
            Some(TokenKind::Error) => self.fail(ParseErrorKind::UnexpectedString { expected }),
            Some(kind) if kind.is_error() => self.fail(ParseErrorKind::LexError(kind)),
            found => self.fail(ParseErrorKind::UnexpectedToken { found, expected }),
        }
    }

    /// Binary operators of at least `min_prec`, grouping to the left.
    fn expression(&mut self, min_prec: u8) -> PResult<'a> {
        let mut lhs = self.prefixed()?;
        while let Some(op) = self.peek().and_then(TokenKind::binary) {
            if op.precedence() < min_prec {
                break;
            }
            self.bump();
            let rhs = self.expression(op.precedence() + 1)?;
            lhs = Node::binary(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn prefixed(&mut self) -> PResult<'a> {
        let sign = self
            .peek()
            .and_then(TokenKind::binary)
            .and_then(BinaryOperator::as_prefix);
        match sign {
            Some(op) => {
                self.bump();
                Ok(Node::unary(op, self.prefixed()?))
            }
            None => self.atom(),
        }
    }

    fn atom(&mut self) -> PResult<'a> {
        let atom = match self.peek() {
            Some(TokenKind::LeftParen) => {
                self.bump();
                self.group_or_set()?
            }
            Some(TokenKind::Decimal) => {
                self.bump();
                Node::Float(self.slice_as()?)
            }
            Some(TokenKind::Integer) => {
                self.bump();
                Node::Int(self.slice_as()?)
            }
            Some(TokenKind::Dice) => {
                self.bump();
                self.dice()?
            }
            _ => return self.unexpected(ATOM_START),
        };
        self.annotations(atom)
    }

    fn annotations(&mut self, node: Node<'a>) -> PResult<'a> {
        let mut labels = Vec::new();
        while self.peek() == Some(TokenKind::Annotation) {
            self.bump();
            let slice = self.lexer.slice();
            labels.push(&slice[1..slice.len() - 1]);
        }
        Ok(match labels.is_empty() {
            true => node,
            false => Node::Annotated(Box::new(node), labels),
        })
    }

    /// Everything after `(`: a grouped expression, or a set when empty or
    /// when a comma follows the first item.
    fn group_or_set(&mut self) -> PResult<'a> {
        if self.peek() == Some(TokenKind::RightParen) {
            self.bump();
            return self.set_tail(Vec::new());
        }
        let first = self.expression(0)?;
        if self.peek() != Some(TokenKind::Comma) {
            self.expect(TokenKind::RightParen)?;
            return Ok(Node::Group(Box::new(first)));
        }

        let mut items = vec![first];
        while self.peek() == Some(TokenKind::Comma) {
            self.bump();
            if self.peek() == Some(TokenKind::RightParen) {
                break;
            }
            items.push(self.expression(0)?);
        }
        self.expect(TokenKind::RightParen)?;
        self.set_tail(items)
    }

    fn set_tail(&mut self, items: Vec<Node<'a>>) -> PResult<'a> {
        let ops = self.operators(true)?;
        Ok(Node::Set(Set::new(items, ops)))
    }

    fn dice(&mut self) -> PResult<'a> {
        let (num, sides) = match Dice::parse_literal(self.lexer.slice()) {
            Ok(literal) => literal,
            Err(_) => return self.fail(ParseErrorKind::InvalidNumber),
        };
        let ops = self.operators(false)?;
        Ok(Node::Dice(Dice::new(num, sides, ops)))
    }

    /// Operators written directly after dice or a set.
    fn operators(&mut self, on_set: bool) -> PResult<'a, Vec<Operator>> {
        let mut ops = Vec::new();
        while let Some(kind) = self.peek_adjacent().and_then(TokenKind::operator) {
            self.bump();
            if on_set && !kind.applies_to_sets() {
                return self.fail(ParseErrorKind::InvalidSetOp(kind));
            }
            let op = match self.selector()? {
                Selector::Equal(bound) if kind.is_clamp() => Operator::bounding(kind, bound),
                sel if kind.is_clamp() => {
                    return self.fail(ParseErrorKind::InvalidMinMaxSelector(sel))
                }
                sel => Operator::selecting(kind, vec1![sel]),
            };
            ops.push(op);
        }
        Ok(ops)
    }

    fn selector(&mut self) -> PResult<'a, Selector> {
        let head = self.peek_adjacent();
        match head {
            Some(TokenKind::Integer) => {
                self.bump();
                return self.slice_as().map(Selector::Equal);
            }
            Some(TokenKind::Highest | TokenKind::Lowest | TokenKind::LESS | TokenKind::GREATER) => {
                self.bump();
            }
            _ => return self.unexpected(SELECTOR_START),
        }
        Ok(match head {
            Some(TokenKind::Highest) => Selector::Highest(self.adjacent_number()?),
            Some(TokenKind::Lowest) => Selector::Lowest(self.adjacent_number()?),
            Some(TokenKind::LESS) => Selector::Less(self.adjacent_number()?),
            _ => Selector::Greater(self.adjacent_number()?),
        })
    }

    fn comment(&mut self) -> PResult<'a, Option<&'a str>> {
        match self.peek() {
            None => Ok(None),
            Some(_) if self.spaced && self.allow_comments => {
                let start = self.lexer.peek_span().start;
                Ok(Some(self.lexer.source()[start..].trim()))
            }
            Some(kind) if kind.is_error() && kind != TokenKind::Error => {
                self.bump();
                self.fail(ParseErrorKind::LexError(kind))
            }
            Some(_) => {
                self.bump();
                self.fail(ParseErrorKind::TrailingInput)
            }
        }
    }
}
