use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// memo-lint CLI options.
#[derive(Debug, Parser)]
#[command(
    name = "memo-lint",
    version,
    about = "Find and collapse obsolete Sorbet strict-mode memoization",
    args_conflicts_with_subcommands = true,
    subcommand_precedence_over_arg = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub lint: LintArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lint files or directories.
    Lint(LintArgs),

    /// List available lints.
    ListRules,

    /// Explain a lint.
    Explain {
        /// Lint rule name.
        rule: String,
    },
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LintArgs {
    /// Files/directories to lint. Defaults to stdin when absent.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Only run these lints (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip these lints (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Exit with code 1 if any diagnostics are emitted.
    #[arg(long)]
    pub deny_warnings: bool,

    /// Path to a memo-lint.toml (defaults to searching upward from the first PATH).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bundler lockfile used to resolve the installed Sorbet version.
    #[arg(long, value_name = "FILE")]
    pub lockfile: Option<PathBuf>,

    /// Rewrite files in place with the suggested corrections.
    #[arg(long, conflicts_with = "diff")]
    pub fix: bool,

    /// Print corrections as a unified diff without writing files.
    #[arg(long)]
    pub diff: bool,

    /// Override the maximum line width used when rewriting.
    #[arg(long, value_name = "COLUMNS")]
    pub max_line_width: Option<usize>,

    /// Override the indentation step used when rewriting.
    #[arg(long, value_name = "SPACES")]
    pub indent_width: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Github,
}
