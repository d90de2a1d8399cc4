//! Toolchain version gate.
//!
//! The memoization rewrite only makes sense once the locked `sorbet-static`
//! understands `@x ||= T.let(...)` in strict files. Projects that do not lock
//! the toolchain at all are left alone.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use crate::lockfile::LockedPackages;

/// Package whose locked version enables the rule.
pub const TOOLCHAIN_PACKAGE: &str = "sorbet-static";

/// First toolchain release accepting the single-statement memoization form.
pub const MINIMUM_TOOLCHAIN_VERSION: &str = "0.5.10210";

/// Dotted numeric version. Missing trailing components compare as zero.
///
/// Pre-release or platform suffixes are not understood; strings carrying them
/// fail to parse.
#[derive(Debug, Clone)]
pub struct Version(Vec<u64>);

impl Version {
    pub fn parse(text: &str) -> Option<Self> {
        let components = text
            .trim()
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                part.parse::<u64>().ok()
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self(components))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0);
                let b = other.0.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

/// Decide whether the rule is active for this snapshot.
///
/// Absent toolchain and unparseable versions both resolve to inactive.
pub fn resolve(packages: &LockedPackages) -> bool {
    resolve_against(packages, MINIMUM_TOOLCHAIN_VERSION)
}

pub(crate) fn resolve_against(packages: &LockedPackages, minimum: &str) -> bool {
    let Some(locked) = packages.version_of(TOOLCHAIN_PACKAGE) else {
        crate::debug_event!(package = TOOLCHAIN_PACKAGE, "toolchain not locked; gate inactive");
        return false;
    };
    let (Some(locked_version), Some(minimum_version)) =
        (Version::parse(locked), Version::parse(minimum))
    else {
        crate::debug_event!(version = locked, "unparseable toolchain version; gate inactive");
        return false;
    };

    let active = locked_version >= minimum_version;
    crate::debug_event!(version = locked, active, "resolved toolchain gate");
    active
}

/// Gate resolved at most once per analysis run.
#[derive(Debug, Default)]
pub struct VersionGate {
    packages: LockedPackages,
    resolved: OnceLock<bool>,
}

impl VersionGate {
    pub fn new(packages: LockedPackages) -> Self {
        Self {
            packages,
            resolved: OnceLock::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        *self.resolved.get_or_init(|| resolve(&self.packages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked(version: &str) -> LockedPackages {
        [(TOOLCHAIN_PACKAGE, version)].into_iter().collect()
    }

    #[test]
    fn version_just_below_threshold_is_inactive() {
        assert!(!resolve(&locked("0.5.10209")));
    }

    #[test]
    fn threshold_and_newer_are_active() {
        assert!(resolve(&locked("0.5.10210")));
        assert!(resolve(&locked("0.5.10211")));
        assert!(resolve(&locked("0.6.0")));
        assert!(resolve(&locked("0.5.10210.1")));
    }

    #[test]
    fn comparison_is_numeric_not_lexical() {
        assert!(!resolve(&locked("0.5.9999")));
        assert!(Version::parse("0.5.10210") > Version::parse("0.5.9999"));
    }

    #[test]
    fn missing_toolchain_is_inactive() {
        let packages: LockedPackages = [("sorbet-runtime", "0.5.11000")].into_iter().collect();
        assert!(!resolve(&packages));
        assert!(!resolve(&LockedPackages::new()));
    }

    #[test]
    fn malformed_versions_are_inactive() {
        assert!(!resolve(&locked("0.5.x")));
        assert!(!resolve(&locked("0.5.10210-beta")));
        assert!(!resolve(&locked("")));
        assert!(!resolve(&locked("0..5")));
    }

    #[test]
    fn trailing_zero_components_are_equal() {
        assert_eq!(Version::parse("0.5"), Version::parse("0.5.0"));
        assert_eq!(
            Version::parse("1.2.3").map(|v| v.to_string()).as_deref(),
            Some("1.2.3")
        );
    }

    #[test]
    fn gate_caches_its_first_answer() {
        let gate = VersionGate::new(locked("0.5.10210"));
        assert!(gate.is_active());
        assert!(gate.is_active());
        assert!(!VersionGate::default().is_active());
    }

    #[test]
    fn custom_minimum_is_respected() {
        assert!(!resolve_against(&locked("0.5.10210"), "0.5.10211"));
        assert!(resolve_against(&locked("1.0"), "0.9.9"));
    }
}
