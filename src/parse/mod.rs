pub mod ast;
mod error;
mod lexer;
mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use lexer::TokenKind;

/// Parses a complete dice expression. Any text left over is an error.
pub fn parse(s: &str) -> Result<ast::Expression, ParseError> {
    parser::Parser::new(s).parse()
}

/// Parses a dice expression followed by an optional free-text comment.
///
/// The comment is whatever follows the expression after whitespace, so
/// `1d20+5 Attack!` has the comment `Attack!` while `1d20+5Attack!` is an
/// error.
pub fn parse_commented(s: &str) -> Result<ast::Expression, ParseError> {
    parser::Parser::new(s).with_comments().parse()
}
