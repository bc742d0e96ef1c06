//! Error types for the front end.
//!
//! There are exactly two error categories: lexical errors, raised when the
//! tokenizer cannot match the remaining input, and syntax errors, raised by
//! the parser. Both are fatal at the point of first detection.

use crate::SourcePosition;
use std::fmt;

/// The category of a front-end error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No token matcher accepted the remaining input
    LexError,
    /// The token stream does not form a valid program or expression
    SyntaxError,
}

/// A lexing or parsing error with message and position information.
///
/// # Examples
///
/// ```
/// use nanojs_core::{ErrorKind, ParseError};
///
/// let error = ParseError {
///     kind: ErrorKind::LexError,
///     message: "Unable to match input".to_string(),
///     source_position: None,
///     remaining: Some("£c".to_string()),
/// };
///
/// assert!(matches!(error.kind, ErrorKind::LexError));
/// ```
#[derive(Debug, Clone)]
pub struct ParseError {
    /// The category of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Source position where the error occurred
    pub source_position: Option<SourcePosition>,
    /// For lexical errors, the unmatched remainder of the input
    pub remaining: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::LexError => "LexError",
            ErrorKind::SyntaxError => "SyntaxError",
        };
        write!(f, "{}: {}", kind, self.message)?;
        if let Some(pos) = &self.source_position {
            write!(f, " (line {}, column {})", pos.line, pos.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
