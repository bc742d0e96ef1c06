//! Core source-location and error types for the nanojs front end.
//!
//! This crate provides the foundational types shared by the lexer and
//! parser: source positions and spans, and the error model.
//!
//! # Overview
//!
//! - [`SourcePosition`] - A line/column/offset triple into the source text
//! - [`SourceSpan`] - A half-open range of source positions
//! - [`ParseError`] - Lexing and parsing errors with position information
//! - [`ErrorKind`] - The two error categories (lexical, syntactic)
//!
//! # Examples
//!
//! ```
//! use nanojs_core::{ErrorKind, ParseError, SourcePosition};
//!
//! let error = ParseError {
//!     kind: ErrorKind::SyntaxError,
//!     message: "Unexpected token )".to_string(),
//!     source_position: Some(SourcePosition { line: 0, column: 4, offset: 4 }),
//!     remaining: None,
//! };
//!
//! assert!(error.to_string().contains("Unexpected token"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;

pub use error::{ErrorKind, ParseError};
pub use source::{SourcePosition, SourceSpan};
