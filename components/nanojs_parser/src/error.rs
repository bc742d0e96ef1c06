//! Parser error helpers

use crate::token::Token;
use nanojs_core::{ErrorKind, ParseError, SourcePosition};

/// Create a syntax error at a given position
pub fn syntax_error(message: impl Into<String>, position: Option<SourcePosition>) -> ParseError {
    ParseError {
        kind: ErrorKind::SyntaxError,
        message: message.into(),
        source_position: position,
        remaining: None,
    }
}

/// Create an unexpected-token error naming the token's value
pub fn unexpected_token(token: &Token) -> ParseError {
    syntax_error(
        format!("Unexpected token {}", token.display_value()),
        token.span.as_ref().map(|s| s.start.clone()),
    )
}

/// Create an unexpected-token error that also names the expected kind(s)
pub fn expected_kinds(expected: &str, token: &Token) -> ParseError {
    syntax_error(
        format!(
            "Unexpected token {}, expected {}",
            token.display_value(),
            expected
        ),
        token.span.as_ref().map(|s| s.start.clone()),
    )
}

/// Create an unexpected end-of-input error
pub fn unexpected_eof() -> ParseError {
    syntax_error("Unexpected EOF", None)
}
