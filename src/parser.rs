use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{LintResult, MemoLintError};
use crate::syntax::{Expr, ExprKind, MethodBody, Statement, StatementKind, TextRange};
use crate::visitor::{body_statement_nodes, method_nodes};

fn ruby_language() -> Language {
    tree_sitter_ruby::language()
}

/// Literal kinds whose content changes meaning when their lines are shifted.
const LINE_SENSITIVE_KINDS: &[&str] = &["string", "subshell", "regex", "delimited_symbol"];

pub fn parse_source(source: &str) -> LintResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(ruby_language())
        .map_err(|e| MemoLintError::parse(format!("failed to load Ruby grammar: {e}")))?;

    parser
        .parse(source, None)
        .ok_or_else(|| MemoLintError::parse("tree-sitter failed to parse source"))
}

/// Parse `source` and lower every method body it contains.
pub fn parse_methods(source: &str) -> LintResult<Vec<MethodBody>> {
    let tree = parse_source(source)?;
    Ok(lower_methods(tree.root_node(), source))
}

pub fn lower_methods(root: Node<'_>, source: &str) -> Vec<MethodBody> {
    method_nodes(root)
        .into_iter()
        .map(|method| lower_method(method, source))
        .collect()
}

fn lower_method(method: Node<'_>, source: &str) -> MethodBody {
    let name = method
        .child_by_field_name("name")
        .map(|n| slice(source, n).to_string())
        .unwrap_or_default();

    let statements = body_statement_nodes(method)
        .into_iter()
        .map(|node| lower_statement(node, source))
        .collect();

    MethodBody {
        name,
        range: range_of(method),
        statements,
    }
}

pub(crate) fn lower_statement(node: Node<'_>, source: &str) -> Statement {
    let kind = match node.kind() {
        "comment" => StatementKind::Comment,
        "assignment" => match (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) {
            (Some(left), Some(right)) => StatementKind::Assign {
                target: lower_expr(left, source),
                value: lower_expr(right, source),
            },
            _ => StatementKind::Expression(opaque(node)),
        },
        "operator_assignment" => {
            let operator = node.child_by_field_name("operator").map(|op| op.kind());
            match (
                operator,
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) {
                (Some("||="), Some(left), Some(right)) => StatementKind::OrAssign {
                    target: lower_expr(left, source),
                    value: lower_expr(right, source),
                },
                _ => StatementKind::Expression(opaque(node)),
            }
        }
        _ => StatementKind::Expression(lower_expr(node, source)),
    };

    Statement {
        kind,
        range: range_of(node),
    }
}

pub(crate) fn lower_expr(node: Node<'_>, source: &str) -> Expr {
    let kind = match node.kind() {
        "instance_variable" => ExprKind::InstanceVariable(slice(source, node).to_string()),
        "nil" => ExprKind::Nil,
        "constant" => ExprKind::Constant {
            name: slice(source, node).to_string(),
            top_level: false,
        },
        // `::T` parses as a scope resolution with no scope.
        "scope_resolution" if node.child_by_field_name("scope").is_none() => {
            match node.child_by_field_name("name") {
                Some(name) if name.kind() == "constant" => ExprKind::Constant {
                    name: slice(source, name).to_string(),
                    top_level: true,
                },
                _ => ExprKind::Other,
            }
        }
        "call" => lower_call(node, source),
        "method_call" => lower_legacy_method_call(node, source),
        _ => ExprKind::Other,
    };

    Expr {
        kind,
        range: range_of(node),
        line_sensitive: contains_line_sensitive_text(node),
    }
}

fn lower_call(node: Node<'_>, source: &str) -> ExprKind {
    if node.child_by_field_name("block").is_some() {
        return ExprKind::Other;
    }
    let Some(method) = node.child_by_field_name("method") else {
        return ExprKind::Other;
    };

    ExprKind::Call {
        receiver: node
            .child_by_field_name("receiver")
            .map(|r| Box::new(lower_expr(r, source))),
        method: slice(source, method).to_string(),
        args: lower_arguments(node.child_by_field_name("arguments"), source),
    }
}

/// Grammars before the `call` unification wrap `recv.name` in a `method_call`.
fn lower_legacy_method_call(node: Node<'_>, source: &str) -> ExprKind {
    if node.child_by_field_name("block").is_some() {
        return ExprKind::Other;
    }
    let Some(callee) = node.child_by_field_name("method") else {
        return ExprKind::Other;
    };
    let args = lower_arguments(node.child_by_field_name("arguments"), source);

    match lower_call(callee, source) {
        ExprKind::Call {
            receiver, method, ..
        } => ExprKind::Call {
            receiver,
            method,
            args,
        },
        _ if callee.kind() == "identifier" => ExprKind::Call {
            receiver: None,
            method: slice(source, callee).to_string(),
            args,
        },
        _ => ExprKind::Other,
    }
}

fn lower_arguments(arguments: Option<Node<'_>>, source: &str) -> Vec<Expr> {
    let Some(arguments) = arguments else {
        return Vec::new();
    };
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .map(|n| lower_expr(n, source))
        .collect()
}

fn contains_line_sensitive_text(node: Node<'_>) -> bool {
    let kind = node.kind();
    if kind.starts_with("heredoc") {
        return true;
    }
    if LINE_SENSITIVE_KINDS.contains(&kind) && node.start_position().row != node.end_position().row
    {
        return true;
    }

    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| contains_line_sensitive_text(child));
    found
}

fn opaque(node: Node<'_>) -> Expr {
    Expr {
        kind: ExprKind::Other,
        range: range_of(node),
        line_sensitive: contains_line_sensitive_text(node),
    }
}

fn range_of(node: Node<'_>) -> TextRange {
    TextRange::new(node.start_byte(), node.end_byte())
}

fn slice<'a>(source: &'a str, node: Node<'_>) -> &'a str {
    // tree-sitter offsets are UTF-8 byte indices; fall back to "" rather than panic
    // if they ever miss a char boundary.
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_method(source: &str) -> MethodBody {
        let mut methods = parse_methods(source).expect("source should parse");
        assert_eq!(methods.len(), 1, "expected exactly one method");
        methods.remove(0)
    }

    #[test]
    fn lowers_reset_and_or_assign_statements() {
        let source = "def foo\n  @foo = T.let(@foo, T.nilable(Foo))\n  @foo ||= Foo.new\nend\n";
        let method = only_method(source);
        assert_eq!(method.name, "foo");
        assert_eq!(method.statements.len(), 2);

        let StatementKind::Assign { target, value } = &method.statements[0].kind else {
            panic!("expected assignment, got {:?}", method.statements[0].kind);
        };
        assert_eq!(target.instance_variable(), Some("@foo"));
        let ExprKind::Call {
            receiver,
            method: name,
            args,
        } = &value.kind
        else {
            panic!("expected call, got {:?}", value.kind);
        };
        assert_eq!(name, "let");
        assert!(matches!(
            receiver.as_deref().map(|r| &r.kind),
            Some(ExprKind::Constant { name, top_level: false }) if name == "T"
        ));
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].text(source), "T.nilable(Foo)");

        let StatementKind::OrAssign { target, value } = &method.statements[1].kind else {
            panic!("expected or-assign, got {:?}", method.statements[1].kind);
        };
        assert_eq!(target.instance_variable(), Some("@foo"));
        assert_eq!(value.text(source), "Foo.new");
    }

    #[test]
    fn top_level_constant_receiver_is_marked() {
        let source = "def foo\n  @foo = ::T.let(nil, ::T.nilable(Foo))\nend\n";
        let method = only_method(source);
        let StatementKind::Assign { value, .. } = &method.statements[0].kind else {
            panic!("expected assignment");
        };
        let ExprKind::Call { receiver, args, .. } = &value.kind else {
            panic!("expected call");
        };
        assert!(matches!(
            receiver.as_deref().map(|r| &r.kind),
            Some(ExprKind::Constant { name, top_level: true }) if name == "T"
        ));
        assert_eq!(args[0].kind, ExprKind::Nil);
    }

    #[test]
    fn comments_and_other_operators_are_plain_statements() {
        let source = "def foo\n  # note\n  @count += 1\nend\n";
        let method = only_method(source);
        assert_eq!(method.statements.len(), 2);
        assert_eq!(method.statements[0].kind, StatementKind::Comment);
        assert!(matches!(
            method.statements[1].kind,
            StatementKind::Expression(_)
        ));
    }

    #[test]
    fn heredoc_initializers_are_line_sensitive() {
        let source = "def foo\n  @foo ||= <<~TEXT\n    body\n  TEXT\nend\n";
        let method = only_method(source);
        let StatementKind::OrAssign { value, .. } = &method.statements[0].kind else {
            panic!("expected or-assign");
        };
        assert!(value.line_sensitive);
    }

    #[test]
    fn multi_line_calls_are_not_line_sensitive() {
        let source = "def foo\n  @foo ||= build(\n    a,\n    b,\n  )\nend\n";
        let method = only_method(source);
        let StatementKind::OrAssign { value, .. } = &method.statements[0].kind else {
            panic!("expected or-assign");
        };
        assert!(!value.line_sensitive);
    }

    #[test]
    fn finds_methods_nested_in_classes() {
        let source = "class A\n  def one; end\n  def self.two\n    1\n  end\nend\n";
        let methods = parse_methods(source).expect("source should parse");
        let names: Vec<_> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["one", "two"]);
    }
}
