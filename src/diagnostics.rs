use crate::fix::Correction;
use crate::level::LintLevel;
use crate::lint::LintDescriptor;
use crate::syntax::TextRange;

/// A single lint finding produced by memo-lint.
#[derive(Debug, Clone)]
#[must_use]
pub struct Diagnostic {
    pub lint: &'static LintDescriptor,
    pub level: LintLevel,
    pub file: Option<String>,
    /// Byte range of the flagged text.
    pub range: TextRange,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
    pub suggestion: Option<Suggestion>,
}

/// Optional fix for a diagnostic.
///
/// The correction's edits are independent of the diagnostic's span: a
/// suggestion may rewrite more text than the diagnostic flags.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub message: String,
    pub correction: Correction,
}

/// Span in a Ruby source file (1-based row/column positions, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Single position in a Ruby source file (1-based row/column in chars).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Span {
    /// Convert a byte range into 1-based row/column positions.
    #[must_use]
    pub fn from_range(source: &str, range: TextRange) -> Self {
        Self {
            start: Position::from_byte_offset(source, range.start),
            end: Position::from_byte_offset(source, range.end),
        }
    }
}

impl Position {
    #[must_use]
    pub fn from_byte_offset(source: &str, byte_offset: usize) -> Self {
        let mut row = 1usize;
        let mut column = 1usize;

        for (i, c) in source.char_indices() {
            if i >= byte_offset {
                break;
            }
            if c == '\n' {
                row += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Position { row, column }
    }
}
