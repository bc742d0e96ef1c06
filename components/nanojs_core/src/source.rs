//! Source position and span types for location tracking.
//!
//! Positions are zero-indexed for both line and column; the offset is an
//! absolute character index from the start of the source.

use serde::{Deserialize, Serialize};

/// Represents a position in source code.
///
/// Used by tokens and AST nodes to report where in the source they came
/// from, and by errors to point at the offending character.
///
/// # Examples
///
/// ```
/// use nanojs_core::SourcePosition;
///
/// let pos = SourcePosition {
///     line: 2,
///     column: 7,
///     offset: 31,
/// };
///
/// assert_eq!(pos.line, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Line number (0-indexed)
    pub line: u32,
    /// Column number (0-indexed)
    pub column: u32,
    /// Character offset from the start of the source
    pub offset: usize,
}

/// A half-open range of source positions.
///
/// `start` is the position of the first character covered; `end` points at
/// the character AFTER the last one covered, so an empty span has
/// `start == end`.
///
/// # Examples
///
/// ```
/// use nanojs_core::{SourcePosition, SourceSpan};
///
/// let span = SourceSpan {
///     start: SourcePosition { line: 0, column: 0, offset: 0 },
///     end: SourcePosition { line: 0, column: 3, offset: 3 },
/// };
///
/// assert!(span.start.offset <= span.end.offset);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    /// First covered position (inclusive)
    pub start: SourcePosition,
    /// Position one past the last covered character (exclusive)
    pub end: SourcePosition,
}

impl SourceSpan {
    /// Create a span from a start/end pair.
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Check whether this span fully contains another span.
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_position_creation() {
        let pos = SourcePosition {
            line: 10,
            column: 5,
            offset: 150,
        };
        assert_eq!(pos.line, 10);
        assert_eq!(pos.column, 5);
        assert_eq!(pos.offset, 150);
    }

    #[test]
    fn test_empty_span() {
        let pos = SourcePosition {
            line: 0,
            column: 0,
            offset: 0,
        };
        let span = SourceSpan::new(pos.clone(), pos);
        assert_eq!(span.start, span.end);
    }

    #[test]
    fn test_span_contains() {
        let outer = SourceSpan {
            start: SourcePosition { line: 0, column: 0, offset: 0 },
            end: SourcePosition { line: 0, column: 10, offset: 10 },
        };
        let inner = SourceSpan {
            start: SourcePosition { line: 0, column: 2, offset: 2 },
            end: SourcePosition { line: 0, column: 5, offset: 5 },
        };
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }
}
