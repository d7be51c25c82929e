//! Command-line behaviour that needs no registry.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pkgbump(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("pkgbump").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PKGBUMP_REMOTE")
        .env_remove("PKGBUMP_BRANCH")
        .env_remove("PKGBUMP_PREFIX")
        .env_remove("PKGBUMP_ACCESS")
        .env_remove("RUST_LOG")
        .env("GIT_CEILING_DIRECTORIES", dir.path().parent().unwrap());
    cmd
}

#[test]
fn test_help_lists_options() {
    let dir = TempDir::new().unwrap();
    pkgbump(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("RELEASE_TYPE"))
        .stdout(predicate::str::contains("--remote"))
        .stdout(predicate::str::contains("--access"));
}

#[test]
fn test_missing_release_type_is_usage_error() {
    let dir = TempDir::new().unwrap();
    pkgbump(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("A release type is required"));
}

#[test]
fn test_missing_release_type_json() {
    let dir = TempDir::new().unwrap();
    let output = pkgbump(&dir).arg("--json").output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["error"]["kind"], "usage");
    assert_eq!(envelope["error"]["code"], "missing_release_type");
}

#[test]
fn test_invalid_access_is_usage_error() {
    let dir = TempDir::new().unwrap();
    pkgbump(&dir)
        .args(["patch", "--access", "team"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid access level \"team\""));
}

#[test]
fn test_access_from_environment() {
    let dir = TempDir::new().unwrap();
    pkgbump(&dir)
        .env("PKGBUMP_ACCESS", "nobody")
        .arg("patch")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("\"nobody\""));
}

#[test]
fn test_outside_repository_is_usage_error() {
    if which::which("git").is_err() {
        eprintln!("Skipping: git not found on PATH");
        return;
    }
    let dir = TempDir::new().unwrap();
    pkgbump(&dir)
        .arg("patch")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Git couldn't find the branch: \"HEAD\""));
}
