use anyhow::Context;
use clap::Parser;
use memo_lint::LintEngine;
use memo_lint::cli::{Args, Command, LintArgs, OutputFormat};
use memo_lint::config::{self, MemoLintConfig};
use memo_lint::diagnostics::Diagnostic;
use memo_lint::fixer::{self, FixSummary};
use memo_lint::level::LintLevel;
use memo_lint::lint::{AnalysisEnv, LintRegistry, LintSettings};
use memo_lint::lockfile::{LockedPackages, find_lockfile};
use memo_lint::synthesize::FormatConfig;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

const RUBY_EXTENSIONS: &[&str] = &["rb", "rake", "ru"];

fn main() -> ExitCode {
    memo_lint::telemetry::init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Some(Command::ListRules) => {
            list_rules();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Explain { rule }) => {
            explain_rule(&rule)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Lint(lint)) => lint_command(lint),
        None => lint_command(args.lint),
    }
}

fn list_rules() {
    let registry = LintRegistry::default_rules();
    let mut rules: Vec<_> = registry.descriptors().collect();
    rules.sort_by_key(|d| d.name);

    for d in rules {
        println!(
            "{}\t{}\t{} [fix]",
            d.name,
            d.category.as_str(),
            d.description
        );
    }
}

fn explain_rule(rule: &str) -> anyhow::Result<()> {
    let Some(d) = LintRegistry::default_rules().find_descriptor(rule) else {
        anyhow::bail!("unknown lint: {rule}");
    };

    println!("name: {}", d.name);
    println!("category: {}", d.category.as_str());
    println!("description: {}", d.description);
    println!("fix: {}", d.fix.description);
    Ok(())
}

/// One unit of input: a file on disk or stdin.
struct Input {
    path: Option<PathBuf>,
    source: String,
}

impl Input {
    fn label(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "stdin".to_string(), |p| p.display().to_string())
    }
}

fn lint_command(args: LintArgs) -> anyhow::Result<ExitCode> {
    if (args.fix || args.diff) && args.paths.is_empty() {
        return Err(fixer::FixerError::StdinNotSupported.into());
    }

    let start_dir = infer_start_dir(&args)?;
    let loaded_cfg = config::load_config(args.config.as_deref(), &start_dir)?;
    let cfg = loaded_cfg.map(|(_path, cfg)| cfg).unwrap_or_default();

    let settings = LintSettings::default()
        .with_config_levels(cfg.lints.levels.clone())
        .disable(cfg.lints.disabled.clone());

    let registry =
        LintRegistry::default_rules_filtered(&args.only, &args.skip, &cfg.lints.disabled)?;
    let packages = load_packages(&args, &cfg, &start_dir)?;
    let env = AnalysisEnv::new(packages, format_config(&args, &cfg));
    let engine = LintEngine::new_with_settings(registry, settings, env);

    let inputs = read_inputs(&args.paths)?;
    let mut reports = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let mut diagnostics = engine
            .lint_source(&input.source)
            .with_context(|| format!("failed to lint {}", input.label()))?;
        for diag in &mut diagnostics {
            diag.file = Some(input.label());
        }
        reports.push(diagnostics);
    }

    if args.fix || args.diff {
        return fix_command(&args, &inputs, &reports);
    }

    let total_diags: usize = reports.iter().map(Vec::len).sum();
    let has_error = reports
        .iter()
        .flatten()
        .any(|d| d.level.is_error());

    match args.format {
        OutputFormat::Json => {
            let out: Vec<JsonDiagnostic> = reports
                .iter()
                .flatten()
                .map(JsonDiagnostic::from_diagnostic)
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Pretty => {
            for (input, diagnostics) in inputs.iter().zip(&reports) {
                for diag in diagnostics {
                    print_pretty(diag);
                }
                println!("{} diagnostics for {}", diagnostics.len(), input.label());
            }
        }
        OutputFormat::Github => {
            for diag in reports.iter().flatten() {
                print_github(diag, args.deny_warnings);
            }
        }
    }

    if has_error || (args.deny_warnings && total_diags > 0) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Handle `--fix` and `--diff`: apply suggestions, then write or print.
fn fix_command(
    args: &LintArgs,
    inputs: &[Input],
    reports: &[Vec<Diagnostic>],
) -> anyhow::Result<ExitCode> {
    let mut summary = FixSummary::default();

    for (input, diagnostics) in inputs.iter().zip(reports) {
        let Some(path) = input.path.as_deref() else {
            continue;
        };
        if diagnostics.is_empty() {
            continue;
        }

        let result = fixer::apply_fixes(&input.source, diagnostics)
            .with_context(|| format!("failed to apply fixes to {}", path.display()))?;
        summary.record(&result);
        if result.fixes_applied == 0 {
            continue;
        }

        if args.diff {
            let diff = fixer::format_diff(&input.source, &result.fixed_source, path);
            if !diff.is_empty() {
                println!("{diff}");
            }
        } else {
            std::fs::write(path, &result.fixed_source)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    if args.diff {
        println!();
    }
    println!("{}", summary.render(args.diff));

    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, Serialize)]
struct JsonDiagnostic {
    file: String,
    row: usize,
    column: usize,
    end_row: usize,
    end_column: usize,
    level: String,
    lint: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    fixable: bool,
}

impl JsonDiagnostic {
    fn from_diagnostic(d: &Diagnostic) -> Self {
        Self {
            file: d.file.clone().unwrap_or_else(|| "stdin".to_string()),
            row: d.span.start.row,
            column: d.span.start.column,
            end_row: d.span.end.row,
            end_column: d.span.end.column,
            level: d.level.as_str().to_string(),
            lint: d.lint.name.to_string(),
            message: d.message.clone(),
            help: d.help.clone(),
            fixable: d.suggestion.is_some(),
        }
    }
}

fn print_pretty(diag: &Diagnostic) {
    let file = diag.file.as_deref().unwrap_or("stdin");
    println!(
        "{}:{}:{}: {}: {}: {}",
        file,
        diag.span.start.row,
        diag.span.start.column,
        diag.level.as_str(),
        diag.lint.name,
        diag.message
    );
    if let Some(help) = &diag.help {
        println!("  = help: {help}");
    }
}

fn print_github(diag: &Diagnostic, deny_warnings: bool) {
    let file = diag.file.as_deref().unwrap_or("stdin");
    let kind = if diag.level == LintLevel::Error || (deny_warnings && diag.level == LintLevel::Warn)
    {
        "error"
    } else {
        "warning"
    };
    println!(
        "::{} file={},line={},col={},title={}::{}",
        kind,
        github_escape(file),
        diag.span.start.row,
        diag.span.start.column,
        diag.lint.name,
        github_escape(&diag.message)
    );
}

fn github_escape(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn format_config(args: &LintArgs, cfg: &MemoLintConfig) -> FormatConfig {
    let mut format = cfg.format.to_format_config();
    if let Some(width) = args.max_line_width {
        format.max_line_width = width;
    }
    if let Some(width) = args.indent_width {
        format.indent_width = width;
    }
    format
}

/// `--lockfile`, then `[lockfile] path`, then the nearest `Gemfile.lock`.
///
/// A missing or malformed discovered lockfile leaves the snapshot empty, which
/// keeps version-gated rules off. An explicitly named lockfile must load.
fn load_packages(
    args: &LintArgs,
    cfg: &MemoLintConfig,
    start_dir: &Path,
) -> anyhow::Result<LockedPackages> {
    if let Some(path) = args.lockfile.as_deref().or(cfg.lockfile.path.as_deref()) {
        return LockedPackages::load(path)
            .with_context(|| format!("failed to load lockfile {}", path.display()));
    }

    let Some(path) = find_lockfile(start_dir) else {
        memo_lint::debug_event!(dir = %start_dir.display(), "no Gemfile.lock found");
        return Ok(LockedPackages::new());
    };
    match LockedPackages::load(&path) {
        Ok(packages) => Ok(packages),
        Err(err) => {
            eprintln!("Warning: ignoring {}: {err}", path.display());
            Ok(LockedPackages::new())
        }
    }
}

fn read_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<Input>> {
    if paths.is_empty() {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return Ok(vec![Input { path: None, source }]);
    }

    collect_ruby_files(paths)?
        .into_iter()
        .map(|path| {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Input {
                path: Some(path),
                source,
            })
        })
        .collect()
}

fn collect_ruby_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_file() {
            out.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !should_skip_dir(e.path()));
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
            if entry.file_type().is_file() && is_ruby_file(entry.path()) {
                out.push(entry.into_path());
            }
        }
    }

    out.sort();
    out.dedup();
    Ok(out)
}

fn is_ruby_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| RUBY_EXTENSIONS.contains(&ext))
}

fn should_skip_dir(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
        return false;
    };

    matches!(name, ".git" | "vendor" | "node_modules" | "tmp")
}

fn infer_start_dir(args: &LintArgs) -> anyhow::Result<PathBuf> {
    let base = if let Some(p) = args.paths.first() {
        p.clone()
    } else {
        std::env::current_dir()?
    };

    let base = if base.is_file() {
        base.parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        base
    };

    Ok(base)
}
