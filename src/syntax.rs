//! Statement model consumed by the rules.
//!
//! The parser lowers tree-sitter nodes into this closed set of variants so the
//! matchers can work with plain `match` expressions instead of node kinds.
//! Every node keeps the byte range it was lowered from; text is always read
//! back from the original source.

use std::ops::Range;

/// Half-open byte range `[start, end)` into the analysed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Source text for this range, or `""` when it does not fall on char boundaries.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.as_range()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: TextRange,
    /// Set when the expression holds text whose line starts are significant
    /// (heredocs, multi-line string literals). Such text cannot be re-indented.
    pub line_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// `@name`, stored with its sigil.
    InstanceVariable(String),
    Nil,
    /// `Name`, or `::Name` when `top_level` is set.
    Constant { name: String, top_level: bool },
    Call {
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
    },
    /// Anything the rules never look inside.
    Other,
}

impl Expr {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.range.text(source)
    }

    pub fn instance_variable(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::InstanceVariable(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// `target = value`
    Assign { target: Expr, value: Expr },
    /// `target ||= value`
    OrAssign { target: Expr, value: Expr },
    /// Any other statement, including other operator assignments.
    Expression(Expr),
    Comment,
}

impl Statement {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.range.text(source)
    }
}

/// Top-level statements of one `def`, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    pub name: String,
    pub range: TextRange,
    pub statements: Vec<Statement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_falls_back_to_empty_on_bad_range() {
        let source = "@foo ||= 1";
        assert_eq!(TextRange::new(0, 4).text(source), "@foo");
        assert_eq!(TextRange::new(0, 400).text(source), "");
    }
}
