//! Auto-fix application.
//!
//! Collects the corrections attached to diagnostics and applies them to the
//! source text. Writing the result back is left to the caller.

use crate::diagnostics::Diagnostic;
use crate::fix::{self, TextEdit};
use std::fmt::Write as _;
use std::path::Path;

/// Result of applying fixes to a source file.
#[derive(Debug)]
pub struct FixResult {
    /// The modified source code.
    pub fixed_source: String,
    /// Number of suggestions applied.
    pub fixes_applied: usize,
    /// Diagnostics that carried no suggestion.
    pub fixes_skipped: usize,
}

/// Totals over every file in a `--fix` or `--diff` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixSummary {
    pub fixes_applied: usize,
    pub fixes_skipped: usize,
    /// Files with at least one applied fix.
    pub files_changed: usize,
}

impl FixSummary {
    pub fn record(&mut self, result: &FixResult) {
        self.fixes_applied += result.fixes_applied;
        self.fixes_skipped += result.fixes_skipped;
        if result.fixes_applied > 0 {
            self.files_changed += 1;
        }
    }

    /// Closing report; `dry_run` for `--diff`, where nothing is written.
    pub fn render(&self, dry_run: bool) -> String {
        let mut out = if dry_run {
            format!(
                "{} fix(es) would be applied to {} file(s)",
                self.fixes_applied, self.files_changed
            )
        } else {
            format!(
                "Applied {} fix(es) to {} file(s)",
                self.fixes_applied, self.files_changed
            )
        };
        if self.fixes_skipped > 0 {
            let _ = write!(
                out,
                "\n{} diagnostic(s) have no applicable fix",
                self.fixes_skipped
            );
        }
        out
    }
}

/// Error when applying fixes.
#[derive(Debug, thiserror::Error)]
pub enum FixerError {
    #[error("Cannot apply fixes to stdin - please specify a file path")]
    StdinNotSupported,

    #[error(transparent)]
    Edit(#[from] fix::FixError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Apply the suggestions carried by `diagnostics` to `source`.
pub fn apply_fixes(source: &str, diagnostics: &[Diagnostic]) -> Result<FixResult, FixerError> {
    let mut edits: Vec<TextEdit> = Vec::new();
    let mut applied = 0;
    let mut skipped = 0;

    for diag in diagnostics {
        let Some(suggestion) = &diag.suggestion else {
            skipped += 1;
            continue;
        };

        edits.extend(suggestion.correction.edits().iter().cloned());
        applied += 1;
    }

    let fixed_source = fix::apply_fixes(source, &edits)?;

    Ok(FixResult {
        fixed_source,
        fixes_applied: applied,
        fixes_skipped: skipped,
    })
}

/// Generate a unified diff between original and fixed source.
///
/// Includes context lines (3 lines before and after each change) for better readability.
pub fn format_diff(original: &str, fixed: &str, path: &Path) -> String {
    format_diff_with_context(original, fixed, path, 3)
}

/// Generate a unified diff with configurable context lines.
///
/// The changed region is found by trimming the common prefix and suffix, which
/// is exact for the single contiguous rewrite each correction produces and
/// conservative (one larger hunk) otherwise.
pub fn format_diff_with_context(
    original: &str,
    fixed: &str,
    path: &Path,
    context: usize,
) -> String {
    let orig_lines: Vec<&str> = original.lines().collect();
    let fixed_lines: Vec<&str> = fixed.lines().collect();

    let prefix = orig_lines
        .iter()
        .zip(&fixed_lines)
        .take_while(|(a, b)| a == b)
        .count();
    if prefix == orig_lines.len() && prefix == fixed_lines.len() {
        return String::new();
    }
    let suffix = orig_lines[prefix..]
        .iter()
        .rev()
        .zip(fixed_lines[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let hunk_start = prefix.saturating_sub(context);
    let orig_change_end = orig_lines.len() - suffix;
    let fixed_change_end = fixed_lines.len() - suffix;
    let orig_end = (orig_change_end + context).min(orig_lines.len());
    let fixed_end = (fixed_change_end + context).min(fixed_lines.len());

    let mut output = String::new();
    let path_str = path.display();
    let _ = writeln!(output, "--- a/{path_str}");
    let _ = writeln!(output, "+++ b/{path_str}");
    let _ = writeln!(
        output,
        "@@ -{},{} +{},{} @@",
        hunk_start + 1,
        orig_end - hunk_start,
        hunk_start + 1,
        fixed_end - hunk_start
    );

    for line in &orig_lines[hunk_start..prefix] {
        let _ = writeln!(output, " {line}");
    }
    for line in &orig_lines[prefix..orig_change_end] {
        let _ = writeln!(output, "-{line}");
    }
    for line in &fixed_lines[prefix..fixed_change_end] {
        let _ = writeln!(output, "+{line}");
    }
    for line in &orig_lines[orig_change_end..orig_end] {
        let _ = writeln!(output, " {line}");
    }

    output
}
