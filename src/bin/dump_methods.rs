//! Print the lowered method bodies of a Ruby file, one statement per line.

use std::env;
use std::fs;

use memo_lint::parser::parse_methods;
use memo_lint::syntax::{ExprKind, StatementKind};

fn describe(kind: &StatementKind) -> &'static str {
    match kind {
        StatementKind::Assign { target, .. } if target.instance_variable().is_some() => {
            "ivar-assign"
        }
        StatementKind::Assign { .. } => "assign",
        StatementKind::OrAssign { .. } => "or-assign",
        StatementKind::Expression(expr) => match expr.kind {
            ExprKind::Call { .. } => "call",
            _ => "expression",
        },
        StatementKind::Comment => "comment",
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: dump_methods <file.rb>");
        std::process::exit(1);
    }

    let file_path = &args[1];
    let source = fs::read_to_string(file_path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", file_path, e);
        std::process::exit(1);
    });

    let methods = parse_methods(&source).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", file_path, e);
        std::process::exit(1);
    });

    println!("Methods in {}:", file_path);
    println!("================");
    for method in &methods {
        println!("def {} [{}..{}]", method.name, method.range.start, method.range.end);
        for stmt in &method.statements {
            let text = stmt.text(&source);
            let text = if text.chars().count() > 60 {
                format!("{}...", text.chars().take(60).collect::<String>())
            } else {
                text.to_string()
            };
            println!("  {:<12} {}", describe(&stmt.kind), text.replace('\n', "\\n"));
        }
    }
}
