//! Detects and rewrites obsolete Sorbet strict-mode memoization.
//!
//! The crate exposes a tree-sitter based `LintEngine`. Source is parsed with
//! tree-sitter-ruby, every `def` body is lowered into the small statement model
//! in [`syntax`], and each registered rule runs over those bodies. Rules that
//! depend on the locked toolchain consult the run's [`gate::VersionGate`],
//! which is resolved once and then shared read-only.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fix;
pub mod fixer;
pub mod gate;
pub mod level;
pub mod lint;
pub mod lockfile;
pub mod parser;
pub mod rules;
pub mod synthesize;
pub mod syntax;
pub mod telemetry;
pub mod visitor;

use anyhow::{Context, Result};
use std::path::Path;

use crate::diagnostics::Diagnostic;
use crate::lint::{AnalysisEnv, LintContext, LintRegistry, LintRule, LintSettings};
use crate::lockfile::LockedPackages;
use crate::parser::parse_methods;
use crate::synthesize::FormatConfig;
use crate::syntax::MethodBody;

/// Engine orchestrates linting by parsing source and running registered rules.
pub struct LintEngine {
    registry: LintRegistry,
    settings: LintSettings,
    env: AnalysisEnv,
}

impl LintEngine {
    /// Create a new engine with default lint settings.
    pub fn new(registry: LintRegistry, env: AnalysisEnv) -> Self {
        Self {
            registry,
            settings: LintSettings::default(),
            env,
        }
    }

    /// Create a new engine with explicit lint settings (e.g. from config).
    pub fn new_with_settings(
        registry: LintRegistry,
        settings: LintSettings,
        env: AnalysisEnv,
    ) -> Self {
        Self {
            registry,
            settings,
            env,
        }
    }

    pub fn env(&self) -> &AnalysisEnv {
        &self.env
    }

    /// Lint a single in-memory source string and return diagnostics.
    ///
    /// Nothing is parsed when no registered rule applies to this run.
    pub fn lint_source(&self, source: &str) -> Result<Vec<Diagnostic>> {
        let active = self.active_rules();
        if active.is_empty() {
            return Ok(Vec::new());
        }
        let methods = crate::instrument_block!("parse", { parse_methods(source) })?;
        Ok(self.run_rules(source, &methods, &active))
    }

    /// Lint a file on disk; diagnostics carry its path.
    pub fn lint_file(&self, path: &Path) -> Result<(String, Vec<Diagnostic>)> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut diagnostics = self
            .lint_source(&source)
            .with_context(|| format!("failed to lint {}", path.display()))?;
        let file = path.display().to_string();
        for diag in &mut diagnostics {
            diag.file = Some(file.clone());
        }
        Ok((source, diagnostics))
    }

    fn active_rules(&self) -> Vec<&dyn LintRule> {
        self.registry
            .rules()
            .filter(|rule| {
                let applies = rule.applies(&self.env);
                if !applies {
                    crate::debug_event!(
                        lint = rule.descriptor().name,
                        "rule inactive for this run"
                    );
                }
                applies
            })
            .collect()
    }

    fn run_rules(
        &self,
        source: &str,
        methods: &[MethodBody],
        rules: &[&dyn LintRule],
    ) -> Vec<Diagnostic> {
        let mut ctx = LintContext::new(source, self.settings.clone(), self.env.format());

        for rule in rules {
            crate::instrument_block!(rule.descriptor().name, {
                for method in methods {
                    rule.check(method, &mut ctx);
                }
            });
        }

        ctx.into_diagnostics()
    }
}

/// Construct a `LintEngine` with all built-in lints and default formatting.
pub fn create_default_engine(packages: LockedPackages) -> LintEngine {
    LintEngine::new(
        LintRegistry::default_rules(),
        AnalysisEnv::new(packages, FormatConfig::default()),
    )
}
