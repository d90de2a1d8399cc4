use crate::level::LintLevel;
use crate::synthesize::{FormatConfig, INDENT_WIDTH, MAX_LINE_WIDTH};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct MemoLintConfig {
    #[serde(default)]
    pub format: FormatSection,

    #[serde(default)]
    pub lockfile: LockfileSection,

    #[serde(default)]
    pub lints: LintsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatSection {
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    #[serde(default = "default_max_line_width")]
    pub max_line_width: usize,
}

impl Default for FormatSection {
    fn default() -> Self {
        Self {
            indent_width: INDENT_WIDTH,
            max_line_width: MAX_LINE_WIDTH,
        }
    }
}

impl FormatSection {
    pub fn to_format_config(&self) -> FormatConfig {
        FormatConfig {
            indent_width: self.indent_width,
            max_line_width: self.max_line_width,
        }
    }
}

fn default_indent_width() -> usize {
    INDENT_WIDTH
}

fn default_max_line_width() -> usize {
    MAX_LINE_WIDTH
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockfileSection {
    /// Relative paths resolve against the config file's directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LintsConfig {
    #[serde(default)]
    pub disabled: Vec<String>,

    #[serde(flatten)]
    pub levels: HashMap<String, LintLevel>,
}

pub const DEFAULT_CONFIG_FILE_NAME: &str = "memo-lint.toml";

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut cur = Some(start_dir);
    while let Some(dir) = cur {
        let candidate = dir.join(DEFAULT_CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = dir.parent();
    }
    None
}

pub fn load_config_file(path: &Path) -> Result<MemoLintConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let mut cfg: MemoLintConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    if let Some(lockfile) = cfg.lockfile.path.as_mut()
        && lockfile.is_relative()
        && let Some(dir) = path.parent()
    {
        *lockfile = dir.join(&*lockfile);
    }

    Ok(cfg)
}

pub fn load_config(
    explicit_path: Option<&Path>,
    start_dir: &Path,
) -> Result<Option<(PathBuf, MemoLintConfig)>> {
    if let Some(p) = explicit_path {
        let cfg = load_config_file(p)?;
        return Ok(Some((p.to_path_buf(), cfg)));
    }

    let Some(p) = find_config_file(start_dir) else {
        return Ok(None);
    };
    let cfg = load_config_file(&p)?;
    Ok(Some((p, cfg)))
}
