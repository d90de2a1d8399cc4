use memo_lint::gate::{self, VersionGate};
use memo_lint::lockfile::{DEFAULT_LOCKFILE_NAME, LockedPackages, find_lockfile};
use std::fs;
use std::path::Path;

fn fixture(name: &str) -> LockedPackages {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/lockfiles")
        .join(name);
    LockedPackages::load(&path).expect("fixture lockfile should load")
}

#[test]
fn bundler_lockfile_activates_gate() {
    let packages = fixture("Gemfile.lock");
    assert_eq!(packages.version_of("sorbet-static"), Some("0.5.10210"));
    assert_eq!(packages.version_of("ast"), Some("2.4.2"));
    assert!(gate::resolve(&packages));
    assert!(VersionGate::new(packages).is_active());
}

#[test]
fn older_toolchain_keeps_gate_off() {
    let packages = fixture("old_sorbet.lock");
    assert_eq!(packages.version_of("sorbet-static"), Some("0.5.10209"));
    assert!(!gate::resolve(&packages));
}

#[test]
fn lockfile_is_found_in_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("lib/tasks");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        dir.path().join(DEFAULT_LOCKFILE_NAME),
        include_str!("fixtures/lockfiles/Gemfile.lock"),
    )
    .unwrap();

    let found = find_lockfile(&nested).expect("lockfile should be found");
    assert_eq!(found, dir.path().join(DEFAULT_LOCKFILE_NAME));
    assert!(gate::resolve(&LockedPackages::load(&found).unwrap()));
}

#[test]
fn missing_lockfile_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = LockedPackages::load(&dir.path().join(DEFAULT_LOCKFILE_NAME)).unwrap_err();
    assert!(matches!(err, memo_lint::error::MemoLintError::Io(_)));
}

#[test]
fn garbage_lockfile_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_LOCKFILE_NAME);
    fs::write(&path, "this is not a lockfile\n").unwrap();
    let err = LockedPackages::load(&path).unwrap_err();
    assert!(err.to_string().contains("malformed lockfile"));
}
