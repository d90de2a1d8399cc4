use crate::diagnostics::Diagnostic;
use crate::gate::VersionGate;
use crate::level::LintLevel;
use crate::lockfile::LockedPackages;
use crate::synthesize::FormatConfig;
use crate::syntax::MethodBody;
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};

/// Descriptor for an auto-fix associated with a lint rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixDescriptor {
    pub description: &'static str,
}

impl FixDescriptor {
    pub const fn new(description: &'static str) -> Self {
        Self { description }
    }
}

/// High-level categories used to group lints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LintCategory {
    Modernization,
}

impl LintCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LintCategory::Modernization => "modernization",
        }
    }
}

/// Static metadata describing a lint rule.
#[derive(Debug)]
pub struct LintDescriptor {
    pub name: &'static str,
    pub category: LintCategory,
    pub description: &'static str,
    pub fix: FixDescriptor,
}

/// Run-scoped inputs shared by every file in one analysis run.
///
/// The version gate resolves lazily on first use and is read-only afterwards.
#[derive(Debug, Default)]
pub struct AnalysisEnv {
    gate: VersionGate,
    format: FormatConfig,
}

impl AnalysisEnv {
    pub fn new(packages: LockedPackages, format: FormatConfig) -> Self {
        Self {
            gate: VersionGate::new(packages),
            format,
        }
    }

    pub fn gate(&self) -> &VersionGate {
        &self.gate
    }

    pub fn format(&self) -> FormatConfig {
        self.format
    }
}

/// A single lint rule run over each method body of a file.
pub trait LintRule: Send + Sync {
    fn descriptor(&self) -> &'static LintDescriptor;

    /// Whether the rule runs at all in this analysis run.
    fn applies(&self, _env: &AnalysisEnv) -> bool {
        true
    }

    fn check(&self, method: &MethodBody, ctx: &mut LintContext<'_>);
}

/// Per-lint configuration derived from `memo-lint.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintSettings {
    levels: HashMap<String, LintLevel>,
}

impl LintSettings {
    #[must_use]
    pub fn with_config_levels(mut self, levels: HashMap<String, LintLevel>) -> Self {
        self.levels.extend(levels);
        self
    }

    #[must_use]
    pub fn disable(mut self, disabled: impl IntoIterator<Item = String>) -> Self {
        for name in disabled {
            self.levels.insert(name, LintLevel::Allow);
        }
        self
    }

    pub fn level_for(&self, lint_name: &str) -> LintLevel {
        self.levels.get(lint_name).copied().unwrap_or_default()
    }
}

/// Mutable context passed to lint rules while analysing one file.
pub struct LintContext<'src> {
    source: &'src str,
    settings: LintSettings,
    format: FormatConfig,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> LintContext<'src> {
    pub fn new(source: &'src str, settings: LintSettings, format: FormatConfig) -> Self {
        Self {
            source,
            settings,
            format,
            diagnostics: Vec::new(),
        }
    }

    /// Record a diagnostic at the configured level; `allow` drops it.
    pub fn report_diagnostic(&mut self, mut diagnostic: Diagnostic) {
        let level = self.settings.level_for(diagnostic.lint.name);
        if level == LintLevel::Allow {
            return;
        }
        diagnostic.level = level;
        self.diagnostics.push(diagnostic);
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn format(&self) -> FormatConfig {
        self.format
    }

    #[must_use]
    pub fn into_diagnostics(mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|d| (d.range.start, d.range.end, d.lint.name));
        self.diagnostics
    }
}

pub fn all_known_lints() -> HashSet<&'static str> {
    LintRegistry::default_rules().descriptors().map(|d| d.name).collect()
}

/// Registry of lint rules run by the engine.
pub struct LintRegistry {
    rules: Vec<Box<dyn LintRule>>,
}

impl Default for LintRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LintRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl LintRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn LintRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static LintDescriptor> + '_ {
        self.rules.iter().map(|r| r.descriptor())
    }

    pub fn find_descriptor(&self, name: &str) -> Option<&'static LintDescriptor> {
        self.descriptors().find(|d| d.name == name)
    }

    #[must_use = "registry should be used to create an engine"]
    pub fn default_rules() -> Self {
        Self::new().with_rule(crate::rules::ObsoleteStrictMemoizationLint)
    }

    /// Filter the built-in rules.
    ///
    /// # Errors
    ///
    /// Returns error if any lint name in `only`, `skip`, or `disabled` is unknown.
    pub fn default_rules_filtered(
        only: &[String],
        skip: &[String],
        disabled: &[String],
    ) -> Result<Self> {
        let known = all_known_lints();
        for n in only.iter().chain(skip.iter()).chain(disabled.iter()) {
            if !known.contains(n.as_str()) {
                return Err(anyhow!("unknown lint: {n}"));
            }
        }

        let mut reg = Self::new();
        for rule in Self::default_rules().rules {
            let name = rule.descriptor().name;

            if !only.is_empty() && !only.iter().any(|n| n == name) {
                continue;
            }
            if skip.iter().chain(disabled.iter()).any(|n| n == name) {
                continue;
            }

            reg.rules.push(rule);
        }

        Ok(reg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_lints_resolve_to_allow() {
        let settings = LintSettings::default().disable(["obsolete_strict_memoization".to_string()]);
        assert_eq!(
            settings.level_for("obsolete_strict_memoization"),
            LintLevel::Allow
        );
        assert_eq!(settings.level_for("anything_else"), LintLevel::Warn);
    }

    #[test]
    fn unknown_lint_names_are_rejected() {
        let err = LintRegistry::default_rules_filtered(&["nope".to_string()], &[], &[])
            .err()
            .expect("unknown lint should fail");
        assert_eq!(err.to_string(), "unknown lint: nope");
    }

    #[test]
    fn skip_removes_the_rule() {
        let reg = LintRegistry::default_rules_filtered(
            &[],
            &["obsolete_strict_memoization".to_string()],
            &[],
        )
        .unwrap();
        assert_eq!(reg.descriptors().count(), 0);
        assert!(
            LintRegistry::default_rules()
                .find_descriptor("obsolete_strict_memoization")
                .is_some()
        );
    }
}
