//! Smoke tests for the lens CLI.
//!
//! These tests verify basic CLI functionality:
//! - `lens --version` outputs version info
//! - `lens --help` lists the commands
//! - unknown commands fail

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_version_flag() {
    let env = TestEnv::new();
    env.lens()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lens"))
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_long_version_includes_commit() {
    let env = TestEnv::new();
    env.lens()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("commit"))
        .stdout(predicate::str::contains("built"));
}

#[test]
fn test_help_flag() {
    let env = TestEnv::new();
    env.lens()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("dashboard"))
        .stdout(predicate::str::contains("--data-dir"));
}

#[test]
fn test_ingest_help() {
    let env = TestEnv::new();
    env.lens()
        .args(["ingest", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--history"))
        .stdout(predicate::str::contains("--tmdb"));
}

#[test]
fn test_invalid_command() {
    let env = TestEnv::new();
    env.lens()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_data_dir_flag_overrides_env() {
    let env = TestEnv::new();
    let other = common::TempDir::new().unwrap();

    env.lens()
        .arg("--data-dir")
        .arg(other.path())
        .arg("init")
        .assert()
        .success();

    assert!(other.path().join("catalog.db").exists());
    assert!(!env.data_path().join("catalog.db").exists());
}
