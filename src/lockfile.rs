//! Locked package versions.
//!
//! `LockedPackages` is the snapshot the version gate reads. The host usually
//! fills it from Bundler's `Gemfile.lock`; tests and embedders can build it
//! directly.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{LintResult, MemoLintError};

pub const DEFAULT_LOCKFILE_NAME: &str = "Gemfile.lock";

/// Snapshot of package name to resolved version string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockedPackages {
    versions: BTreeMap<String, String>,
}

impl LockedPackages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a version. The first entry for a name wins.
    pub fn insert(&mut self, name: impl Into<String>, version: impl Into<String>) {
        self.versions
            .entry(name.into())
            .or_insert_with(|| version.into());
    }

    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.versions.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Parse the `specs:` entries of a Bundler lockfile.
    ///
    /// Only `GEM`, `GIT` and `PATH` sections contribute. Platform suffixes such as
    /// `-x86_64-linux` are dropped from versions.
    pub fn from_lockfile_str(contents: &str) -> LintResult<Self> {
        let mut packages = Self::new();
        let mut in_source_section = false;
        let mut saw_source_section = false;
        let mut in_specs = false;

        for line in contents.lines() {
            if !line.starts_with(' ') {
                in_source_section = matches!(line.trim_end(), "GEM" | "GIT" | "PATH");
                saw_source_section |= in_source_section;
                in_specs = false;
                continue;
            }
            if !in_source_section {
                continue;
            }
            if line.trim_end() == "  specs:" {
                in_specs = true;
                continue;
            }
            if !in_specs {
                continue;
            }
            if let Some(caps) = spec_line_regex().captures(line) {
                packages.insert(&caps[1], strip_platform(&caps[2]));
            }
        }

        if !saw_source_section && !contents.trim().is_empty() {
            return Err(MemoLintError::lockfile(
                "no GEM, GIT or PATH section found",
            ));
        }

        Ok(packages)
    }

    pub fn load(path: &Path) -> LintResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_lockfile_str(&contents)
            .map_err(|e| MemoLintError::lockfile(format!("{}: {e}", path.display())))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LockedPackages {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut packages = Self::new();
        for (name, version) in iter {
            packages.insert(name, version);
        }
        packages
    }
}

/// `    name (version)`: exactly four spaces of indentation marks a top-level spec;
/// deeper lines are that spec's dependencies.
fn spec_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^ {4}([A-Za-z0-9_.\-]+) \(([^)\s]+)\)\s*$").expect("spec line regex is valid")
    })
}

fn strip_platform(version: &str) -> &str {
    version.split_once('-').map_or(version, |(v, _)| v)
}

/// Walk up from `start_dir` looking for a `Gemfile.lock`.
pub fn find_lockfile(start_dir: &Path) -> Option<PathBuf> {
    let mut cur = Some(start_dir);
    while let Some(dir) = cur {
        let candidate = dir.join(DEFAULT_LOCKFILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = dir.parent();
    }
    None
}
