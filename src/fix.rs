//! Text edits and corrections.
//!
//! Everything here is a pure string transformation over byte offsets; no file I/O.
//! Edits are validated to be in bounds and non-overlapping before they are
//! applied, and they are applied back to front so earlier offsets stay valid.

use thiserror::Error;

/// Error type for fix application operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixError {
    #[error("Overlapping edits detected at byte {0}")]
    OverlappingEdits(usize),

    #[error("Edit range [{start}..{end}) exceeds source length {source_len}")]
    InvalidRange {
        start: usize,
        end: usize,
        source_len: usize,
    },

    #[error("Edit start {start} is after edit end {end}")]
    InvalidEditOrder { start: usize, end: usize },

    #[error("Edit boundary {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

/// Replace `[start_byte..end_byte)` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start_byte: usize,
    pub end_byte: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_byte..self.end_byte
    }

    /// Two ranges [a, b) and [c, d) overlap when a < d && c < b.
    pub fn overlaps_with(&self, other: &TextEdit) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }

    pub fn validate(&self, source: &str) -> Result<(), FixError> {
        if self.start_byte > self.end_byte {
            return Err(FixError::InvalidEditOrder {
                start: self.start_byte,
                end: self.end_byte,
            });
        }

        if self.end_byte > source.len() {
            return Err(FixError::InvalidRange {
                start: self.start_byte,
                end: self.end_byte,
                source_len: source.len(),
            });
        }

        for offset in [self.start_byte, self.end_byte] {
            if !source.is_char_boundary(offset) {
                return Err(FixError::NotCharBoundary(offset));
            }
        }

        Ok(())
    }
}

/// Ordered set of non-overlapping edits over one source unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correction {
    edits: Vec<TextEdit>,
}

impl Correction {
    /// Build a correction, sorting edits by start offset.
    pub fn new(mut edits: Vec<TextEdit>) -> Result<Self, FixError> {
        edits.sort_by_key(|e| (e.start_byte, e.end_byte));
        for pair in edits.windows(2) {
            if pair[0].overlaps_with(&pair[1]) {
                return Err(FixError::OverlappingEdits(pair[1].start_byte));
            }
        }
        Ok(Self { edits })
    }

    pub fn replace(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            edits: vec![TextEdit::new(start_byte, end_byte, replacement)],
        }
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn apply(&self, source: &str) -> Result<String, FixError> {
        apply_fixes(source, &self.edits)
    }
}

/// Validate that a list of edits are non-overlapping and within bounds.
pub fn validate_edits(edits: &[TextEdit], source: &str) -> Result<(), FixError> {
    for edit in edits {
        edit.validate(source)?;
    }

    for i in 0..edits.len() {
        for j in (i + 1)..edits.len() {
            if edits[i].overlaps_with(&edits[j]) {
                return Err(FixError::OverlappingEdits(edits[i].start_byte));
            }
        }
    }

    Ok(())
}

/// Apply a list of non-overlapping edits to source code.
///
/// # Errors
///
/// Returns an error if edits overlap or any edit falls outside the source.
///
/// # Example
///
/// ```rust
/// use memo_lint::fix::{TextEdit, apply_fixes};
///
/// let source = "@a = T.let(@a, T.nilable(A))\n@a ||= A.new";
/// let edits = vec![TextEdit::new(0, source.len(), "@a ||= T.let(A.new, T.nilable(A))")];
///
/// let result = apply_fixes(source, &edits).unwrap();
/// assert_eq!(result, "@a ||= T.let(A.new, T.nilable(A))");
/// ```
pub fn apply_fixes(source: &str, edits: &[TextEdit]) -> Result<String, FixError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    validate_edits(edits, source)?;

    let mut sorted_edits = edits.to_vec();
    sorted_edits.sort_by(|a, b| b.start_byte.cmp(&a.start_byte));

    let mut result = source.to_string();
    for edit in sorted_edits {
        result.replace_range(edit.range(), &edit.replacement);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlaps_with_is_half_open() {
        let edit1 = TextEdit::new(0, 10, "a");
        let edit2 = TextEdit::new(5, 15, "b");
        let edit3 = TextEdit::new(10, 20, "c");

        assert!(edit1.overlaps_with(&edit2));
        assert!(edit2.overlaps_with(&edit1));
        assert!(!edit1.overlaps_with(&edit3));
        assert!(!edit3.overlaps_with(&edit1));
    }

    #[test]
    fn validate_rejects_reversed_range() {
        let edit = TextEdit::new(10, 5, "x");
        assert_eq!(
            edit.validate("0123456789abc"),
            Err(FixError::InvalidEditOrder { start: 10, end: 5 })
        );
    }

    #[test]
    fn validate_rejects_out_of_bounds() {
        let edit = TextEdit::new(0, 15, "x");
        assert!(matches!(
            edit.validate("short"),
            Err(FixError::InvalidRange { .. })
        ));
    }

    #[test]
    fn validate_rejects_split_characters() {
        let edit = TextEdit::new(1, 2, "");
        assert_eq!(edit.validate("é"), Err(FixError::NotCharBoundary(1)));
    }

    #[test]
    fn correction_sorts_and_rejects_overlap() {
        let correction = Correction::new(vec![
            TextEdit::new(8, 11, "3"),
            TextEdit::new(0, 3, "1"),
        ])
        .expect("disjoint edits");
        assert_eq!(correction.edits()[0].start_byte, 0);

        let overlapping = Correction::new(vec![TextEdit::new(0, 5, "a"), TextEdit::new(3, 8, "b")]);
        assert_eq!(overlapping, Err(FixError::OverlappingEdits(3)));
    }

    #[test]
    fn applies_edits_in_any_order() {
        let source = "abc def ghi";
        let edits = vec![
            TextEdit::new(8, 11, "3"),
            TextEdit::new(0, 3, "1"),
            TextEdit::new(4, 7, "2"),
        ];
        assert_eq!(apply_fixes(source, &edits).unwrap(), "1 2 3");
    }

    #[test]
    fn insertion_and_deletion() {
        let source = "@foo ||= Foo.new";
        let inserted = apply_fixes(source, &[TextEdit::new(0, 0, "  ")]).unwrap();
        assert_eq!(inserted, "  @foo ||= Foo.new");
        let deleted = apply_fixes(source, &[TextEdit::new(4, 16, "")]).unwrap();
        assert_eq!(deleted, "@foo");
    }

    #[test]
    fn no_edits_is_identity() {
        let source = "unchanged";
        assert_eq!(Correction::default().apply(source).unwrap(), source);
    }

    #[test]
    fn correction_replaces_combined_statements() {
        let source = "def foo\n  @foo = T.let(@foo, T.nilable(Foo))\n  @foo ||= Foo.new\nend\n";
        let start = source.find("@foo =").unwrap();
        let end = source.find("Foo.new").unwrap() + "Foo.new".len();
        let correction = Correction::replace(start, end, "@foo ||= T.let(Foo.new, T.nilable(Foo))");
        assert_eq!(
            correction.apply(source).unwrap(),
            "def foo\n  @foo ||= T.let(Foo.new, T.nilable(Foo))\nend\n"
        );
    }
}
