//! Replacement text for matched memoization pairs.
//!
//! The two statements collapse into `@x ||= T.let(init, Type)`. When that does
//! not fit on one line (or a sub-expression already spans lines) the call is
//! broken after the opening parenthesis with one argument per line, a trailing
//! comma, and the closing parenthesis back at the statement's indentation.

use std::borrow::Cow;

use crate::fix::Correction;
use crate::rules::memoization::MemoizationCandidate;
use crate::syntax::Expr;

/// Default maximum line width, matching RuboCop's `Layout/LineLength`.
pub const MAX_LINE_WIDTH: usize = 120;

/// Spaces per indentation level.
pub const INDENT_WIDTH: usize = 2;

/// Layout limits used when building replacement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Spaces per indentation level. Tab-indented code nests by one tab instead.
    pub indent_width: usize,
    /// Longest line, indentation included, before the nested form is used.
    pub max_line_width: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_width: INDENT_WIDTH,
            max_line_width: MAX_LINE_WIDTH,
        }
    }
}

impl FormatConfig {
    pub fn with_max_line_width(max_line_width: usize) -> Self {
        Self {
            max_line_width,
            ..Default::default()
        }
    }
}

/// Build the correction for a matched pair.
///
/// Returns `None` when a sub-expression cannot be moved safely: heredocs and
/// multi-line literals, or continuation lines that would have to be dedented
/// past their own indentation.
pub fn synthesize(
    source: &str,
    candidate: &MemoizationCandidate<'_>,
    config: &FormatConfig,
) -> Option<Correction> {
    let init = candidate.init_expr;
    let type_expr = candidate.type_expr;
    if init.line_sensitive || type_expr.line_sensitive {
        return None;
    }

    let start = candidate.reset_statement.range.start;
    let end = candidate.or_assign_statement.range.end;
    let prefix = source.get(line_start(source, start)..start)?;

    let single_line = format!(
        "{} ||= {}({}, {})",
        candidate.ivar_name,
        candidate.assertion_call_name,
        init.text(source),
        type_expr.text(source),
    );

    let fits = !single_line.contains('\n')
        && display_width(prefix) + display_width(&single_line) <= config.max_line_width;
    let replacement = if fits {
        single_line
    } else {
        nested_form(source, candidate, leading_whitespace(prefix), config)?
    };

    Some(Correction::replace(start, end, replacement))
}

fn nested_form(
    source: &str,
    candidate: &MemoizationCandidate<'_>,
    indent: &str,
    config: &FormatConfig,
) -> Option<String> {
    let init_text = candidate.init_expr.text(source);
    let type_text = candidate.type_expr.text(source);
    let unit = indent_unit(indent, [init_text, type_text], config);
    let inner = format!("{indent}{unit}");
    let newline = line_terminator(source, candidate.reset_statement.range.start);

    let init = reindent(source, candidate.init_expr, &inner)?;
    let type_expr = reindent(source, candidate.type_expr, &inner)?;

    Some(format!(
        "{} ||= {}({newline}{inner}{init},{newline}{inner}{type_expr},{newline}{indent})",
        candidate.ivar_name, candidate.assertion_call_name,
    ))
}

/// One indentation level in the style the surrounding code uses: a tab for
/// tab-indented code, `indent_width` spaces otherwise.
fn indent_unit(indent: &str, texts: [&str; 2], config: &FormatConfig) -> String {
    let tabbed = indent.starts_with('\t')
        || texts
            .iter()
            .flat_map(|text| text.split('\n').skip(1))
            .any(|line| line.starts_with('\t'));
    if tabbed {
        "\t".to_string()
    } else {
        " ".repeat(config.indent_width)
    }
}

/// Move an expression so its continuation lines sit under `target`.
///
/// Continuation lines were written relative to the indentation of the line the
/// expression starts on; that indentation is swapped for `target`.
fn reindent<'s>(source: &'s str, expr: &Expr, target: &str) -> Option<Cow<'s, str>> {
    let text = expr.text(source);
    if !text.contains('\n') {
        return Some(Cow::Borrowed(text));
    }

    let start = line_start(source, expr.range.start);
    let base = leading_whitespace(source.get(start..expr.range.start)?);
    shift_continuation_lines(text, base, target).map(Cow::Owned)
}

/// Replace the indentation `from` with `to` on every line after the first.
///
/// Blank lines keep only their terminator. A line that does not start with
/// `from` cannot be moved and fails the shift.
pub(crate) fn shift_continuation_lines(text: &str, from: &str, to: &str) -> Option<String> {
    let mut lines = text.split('\n');
    let mut out = String::with_capacity(text.len() + 16);
    out.push_str(lines.next().unwrap_or_default());

    for line in lines {
        out.push('\n');
        let content = line.trim_start_matches([' ', '\t']);
        if content.trim_end_matches('\r').is_empty() {
            out.push_str(content);
            continue;
        }
        out.push_str(to);
        out.push_str(line.strip_prefix(from)?);
    }

    Some(out)
}

/// `\r\n` when the line holding `offset` ends with one, `\n` otherwise.
fn line_terminator(source: &str, offset: usize) -> &'static str {
    let rest = source.get(offset..).unwrap_or_default();
    match rest.find('\n') {
        Some(end) if rest[..end].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

fn line_start(source: &str, offset: usize) -> usize {
    source
        .get(..offset)
        .and_then(|before| before.rfind('\n'))
        .map_or(0, |newline| newline + 1)
}

fn leading_whitespace(text: &str) -> &str {
    let trimmed = text.trim_start_matches([' ', '\t']);
    &text[..text.len() - trimmed.len()]
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_methods;
    use crate::rules::memoization::find_candidates;

    fn corrected(source: &str, config: FormatConfig) -> Option<String> {
        let methods = parse_methods(source).expect("source should parse");
        let candidates: Vec<_> = methods
            .iter()
            .flat_map(|m| find_candidates(source, m))
            .collect();
        assert_eq!(candidates.len(), 1, "expected exactly one candidate");
        let correction = synthesize(source, &candidates[0], &config)?;
        Some(correction.apply(source).expect("correction applies"))
    }

    #[test]
    fn short_pair_collapses_to_one_line() {
        let source = "def foo\n  @foo = T.let(@foo, T.nilable(Foo))\n  @foo ||= Foo.new\nend\n";
        assert_eq!(
            corrected(source, FormatConfig::default()).as_deref(),
            Some("def foo\n  @foo ||= T.let(Foo.new, T.nilable(Foo))\nend\n")
        );
    }

    #[test]
    fn line_exactly_at_limit_stays_single() {
        let source = "def foo\n  @foo = T.let(@foo, T.nilable(Foo))\n  @foo ||= Foo.new\nend\n";
        let line = "  @foo ||= T.let(Foo.new, T.nilable(Foo))";
        let fixed = corrected(source, FormatConfig::with_max_line_width(line.len())).unwrap();
        assert!(fixed.contains(line));

        let fixed = corrected(source, FormatConfig::with_max_line_width(line.len() - 1)).unwrap();
        assert_eq!(
            fixed,
            "def foo\n  @foo ||= T.let(\n    Foo.new,\n    T.nilable(Foo),\n  )\nend\n"
        );
    }

    #[test]
    fn nested_form_uses_configured_indent_width() {
        let source =
            "class A\n    def foo\n        @foo = T.let(@foo, Foo)\n        @foo ||= Foo.new\n    end\nend\n";
        let config = FormatConfig {
            indent_width: 4,
            max_line_width: 20,
        };
        assert_eq!(
            corrected(source, config).as_deref(),
            Some(
                "class A\n    def foo\n        @foo ||= T.let(\n            Foo.new,\n            Foo,\n        )\n    end\nend\n"
            )
        );
    }

    #[test]
    fn multi_line_initializer_is_nested_one_level_deeper() {
        let source = "\
class A
  def foo
    @foo = T.let(@foo, T.nilable(Foo))
    @foo ||= build(
      a,
      b,
    )
  end
end
";
        let expected = "\
class A
  def foo
    @foo ||= T.let(
      build(
        a,
        b,
      ),
      T.nilable(Foo),
    )
  end
end
";
        assert_eq!(
            corrected(source, FormatConfig::default()).as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn heredoc_initializer_has_no_correction() {
        let source = "def foo\n  @foo = T.let(@foo, T.nilable(String))\n  @foo ||= <<~TEXT\n    hi\n  TEXT\nend\n";
        assert_eq!(corrected(source, FormatConfig::default()), None);
    }

    #[test]
    fn tab_indented_initializer_nests_with_tabs() {
        let source = "def foo\n\t@foo = T.let(@foo, T.nilable(Foo))\n\t@foo ||= build(\n\t\ta,\n\t)\nend\n";
        assert_eq!(
            corrected(source, FormatConfig::default()).as_deref(),
            Some("def foo\n\t@foo ||= T.let(\n\t\tbuild(\n\t\t\ta,\n\t\t),\n\t\tT.nilable(Foo),\n\t)\nend\n")
        );
    }

    #[test]
    fn mixed_tab_and_space_indentation_has_no_correction() {
        let source = "def foo\n  @foo = T.let(@foo, T.nilable(Foo))\n  @foo ||= build(\n\t\ta,\n  )\nend\n";
        assert_eq!(corrected(source, FormatConfig::default()), None);
    }

    #[test]
    fn crlf_source_keeps_crlf_line_endings() {
        let source = "def foo\r\n  @foo = T.let(@foo, T.nilable(Foo))\r\n  @foo ||= build(\r\n    a,\r\n\r\n  )\r\nend\r\n";
        let fixed = corrected(source, FormatConfig::default()).unwrap();
        assert_eq!(
            fixed,
            "def foo\r\n  @foo ||= T.let(\r\n    build(\r\n      a,\r\n\r\n    ),\r\n    T.nilable(Foo),\r\n  )\r\nend\r\n"
        );
        assert!(!fixed.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn shift_preserves_blank_lines_and_relative_indent() {
        let text = "call(\n    a,\n\n      b,\n  )";
        assert_eq!(
            shift_continuation_lines(text, "  ", "    ").as_deref(),
            Some("call(\n      a,\n\n        b,\n    )")
        );
    }

    #[test]
    fn shift_requires_the_original_indentation() {
        assert_eq!(shift_continuation_lines("x(\n a)", "    ", "  "), None);
        assert_eq!(shift_continuation_lines("x(\n\ta)", "  ", "\t"), None);
        assert_eq!(
            shift_continuation_lines("x(\n    a)", "    ", "  ").as_deref(),
            Some("x(\n  a)")
        );
    }

    #[test]
    fn leading_whitespace_ignores_code_prefix() {
        assert_eq!(leading_whitespace("    x = 1; "), "    ");
        assert_eq!(leading_whitespace("\t  "), "\t  ");
    }
}
