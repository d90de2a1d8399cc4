use tree_sitter::Node;

const METHOD_KINDS: &[&str] = &["method", "singleton_method"];

/// Clauses that hang off a method body but are not part of its main statement list.
const BODY_CLAUSE_KINDS: &[&str] = &["rescue", "else", "ensure"];

pub trait RubyVisitor<'tree> {
    fn visit_method(&mut self, _node: Node<'tree>) {}
}

pub fn walk_tree<'tree>(root: Node<'tree>, visitor: &mut impl RubyVisitor<'tree>) {
    if METHOD_KINDS.contains(&root.kind()) {
        visitor.visit_method(root);
    }

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        walk_tree(child, visitor);
    }
}

/// Collect every `def` node in document order, nested ones included.
pub fn method_nodes(root: Node<'_>) -> Vec<Node<'_>> {
    struct Collector<'tree>(Vec<Node<'tree>>);

    impl<'tree> RubyVisitor<'tree> for Collector<'tree> {
        fn visit_method(&mut self, node: Node<'tree>) {
            self.0.push(node);
        }
    }

    let mut collector = Collector(Vec::new());
    walk_tree(root, &mut collector);
    collector.0
}

/// Top-level statement nodes of a method, in source order.
///
/// Older grammars put statements directly under the `method` node while newer
/// ones wrap them in a `body_statement`; both shapes are flattened here.
pub fn body_statement_nodes(method: Node<'_>) -> Vec<Node<'_>> {
    let header_ids: Vec<usize> = ["name", "parameters", "object"]
        .iter()
        .filter_map(|field| method.child_by_field_name(field))
        .map(|n| n.id())
        .collect();

    let mut out = Vec::new();
    let mut cursor = method.walk();
    for child in method.named_children(&mut cursor) {
        if header_ids.contains(&child.id()) || BODY_CLAUSE_KINDS.contains(&child.kind()) {
            continue;
        }
        if child.kind() == "body_statement" {
            let mut inner = child.walk();
            out.extend(
                child
                    .named_children(&mut inner)
                    .filter(|n| !BODY_CLAUSE_KINDS.contains(&n.kind())),
            );
            continue;
        }
        out.push(child);
    }
    out
}
