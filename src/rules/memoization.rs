//! Obsolete strict-mode memoization.
//!
//! Older Sorbet releases rejected `@x ||= T.let(...)` in `# typed: strict`
//! files, so code declared the ivar's type in a separate statement first:
//!
//! ```ruby
//! @foo = T.let(@foo, T.nilable(Foo))
//! @foo ||= Foo.new
//! ```
//!
//! Once the locked toolchain accepts the combined form the pair collapses into
//! `@foo ||= T.let(Foo.new, T.nilable(Foo))`. The `T.let(nil, ...)` spelling of
//! the first statement is matched as well; it reset the cache on every call.

use itertools::Itertools;

use crate::diagnostics::{Diagnostic, Span, Suggestion};
use crate::fix::Correction;
use crate::level::LintLevel;
use crate::lint::{
    AnalysisEnv, FixDescriptor, LintCategory, LintContext, LintDescriptor, LintRule,
};
use crate::synthesize::synthesize;
use crate::syntax::{Expr, ExprKind, MethodBody, Statement, StatementKind};

const ASSERTION_RECEIVER: &str = "T";
const ASSERTION_METHOD: &str = "let";

pub const MESSAGE: &str = "This two-stage workaround for memoization in `#typed: strict` files is no longer necessary. \
See https://sorbet.org/docs/type-assertions#put-type-assertions-behind-memoization.";

/// What the reset statement passed as the asserted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetVariant {
    /// `@x = T.let(@x, Type)`: a no-op read that only declares the type.
    TwoStageWorkaround,
    /// `@x = T.let(nil, Type)`: discards any cached value before the `||=`.
    DiscardsCachedValue,
}

/// A reset statement immediately followed by an or-assign of the same ivar.
#[derive(Debug, Clone)]
pub struct MemoizationCandidate<'a> {
    /// Ivar name including the `@` sigil.
    pub ivar_name: &'a str,
    pub reset_statement: &'a Statement,
    pub or_assign_statement: &'a Statement,
    pub type_expr: &'a Expr,
    pub init_expr: &'a Expr,
    /// Call head as written, e.g. `T.let` or `::T.let`.
    pub assertion_call_name: String,
    pub variant: ResetVariant,
}

/// Scan every adjacent statement pair of `body` for the obsolete idiom.
pub fn find_candidates<'a>(source: &str, body: &'a MethodBody) -> Vec<MemoizationCandidate<'a>> {
    body.statements
        .iter()
        .tuple_windows()
        .filter_map(|(reset, or_assign)| match_pair(source, reset, or_assign))
        .collect()
}

fn match_pair<'a>(
    source: &str,
    reset: &'a Statement,
    or_assign: &'a Statement,
) -> Option<MemoizationCandidate<'a>> {
    let StatementKind::Assign { target, value } = &reset.kind else {
        return None;
    };
    let ivar_name = target.instance_variable()?;
    let (assertion_call_name, asserted, type_expr) = type_assertion(source, value)?;

    let variant = match &asserted.kind {
        ExprKind::InstanceVariable(name) if name == ivar_name => ResetVariant::TwoStageWorkaround,
        ExprKind::Nil => ResetVariant::DiscardsCachedValue,
        _ => return None,
    };

    let StatementKind::OrAssign {
        target: memo_target,
        value: init_expr,
    } = &or_assign.kind
    else {
        return None;
    };
    if memo_target.instance_variable()? != ivar_name {
        return None;
    }

    Some(MemoizationCandidate {
        ivar_name,
        reset_statement: reset,
        or_assign_statement: or_assign,
        type_expr,
        init_expr,
        assertion_call_name,
        variant,
    })
}

/// Split `T.let(value, Type)` / `::T.let(value, Type)` into its call head and arguments.
fn type_assertion<'e>(source: &str, expr: &'e Expr) -> Option<(String, &'e Expr, &'e Expr)> {
    let ExprKind::Call {
        receiver: Some(receiver),
        method,
        args,
    } = &expr.kind
    else {
        return None;
    };
    if method != ASSERTION_METHOD {
        return None;
    }
    match &receiver.kind {
        ExprKind::Constant { name, .. } if name == ASSERTION_RECEIVER => {}
        _ => return None,
    }
    let [asserted, type_expr] = args.as_slice() else {
        return None;
    };

    let head = source.get(expr.range.start..asserted.range.start)?.trim_end();
    let head = head.strip_suffix('(').unwrap_or(head).trim_end();
    Some((head.to_string(), asserted, type_expr))
}

pub struct ObsoleteStrictMemoizationLint;

pub static OBSOLETE_STRICT_MEMOIZATION: LintDescriptor = LintDescriptor {
    name: "obsolete_strict_memoization",
    category: LintCategory::Modernization,
    description: "Collapse `@x = T.let(@x, T.nilable(X))` + `@x ||= init` into `@x ||= T.let(init, T.nilable(X))`",
    fix: FixDescriptor::new("Replace both statements with a single `||=` wrapped in `T.let`"),
};

impl LintRule for ObsoleteStrictMemoizationLint {
    fn descriptor(&self) -> &'static LintDescriptor {
        &OBSOLETE_STRICT_MEMOIZATION
    }

    fn applies(&self, env: &AnalysisEnv) -> bool {
        env.gate().is_active()
    }

    fn check(&self, method: &MethodBody, ctx: &mut LintContext<'_>) {
        let source = ctx.source();
        let format = ctx.format();

        for candidate in find_candidates(source, method) {
            let correction = synthesize(source, &candidate, &format);
            if correction.is_none() {
                crate::debug_event!(
                    method = %method.name,
                    ivar = candidate.ivar_name,
                    "initializer cannot be re-indented; reporting without a fix"
                );
            }
            ctx.report_diagnostic(emit(source, &candidate, correction));
        }
    }
}

/// Package a match and its correction (if any) into a diagnostic on the reset statement.
pub fn emit(
    source: &str,
    candidate: &MemoizationCandidate<'_>,
    correction: Option<Correction>,
) -> Diagnostic {
    let lint = &OBSOLETE_STRICT_MEMOIZATION;
    let range = candidate.reset_statement.range;

    let help = match candidate.variant {
        ResetVariant::TwoStageWorkaround => format!(
            "Assign with `{} ||= {}(...)` directly",
            candidate.ivar_name, candidate.assertion_call_name
        ),
        ResetVariant::DiscardsCachedValue => format!(
            "`{}(nil, ...)` resets `{}` on every call, so the value was never memoized",
            candidate.assertion_call_name, candidate.ivar_name
        ),
    };

    Diagnostic {
        lint,
        level: LintLevel::default(),
        file: None,
        range,
        span: Span::from_range(source, range),
        message: MESSAGE.to_string(),
        help: Some(help),
        suggestion: correction.map(|correction| Suggestion {
            message: lint.fix.description.to_string(),
            correction,
        }),
    }
}
