//! Integration tests for the bootstrap CLI surface.
//!
//! Flag validation must happen before any side effect, so these tests also
//! assert that rejected invocations leave the filesystem untouched.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bootstrap() -> Command {
    Command::cargo_bin("bootstrap").expect("bootstrap binary should exist")
}

#[test]
fn no_args_shows_usage_error() {
    bootstrap()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--distbuild-path"));
}

#[test]
fn help_lists_both_modes() {
    bootstrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("boong bootstrap"))
        .stdout(predicate::str::contains("--aosp-path"))
        .stdout(predicate::str::contains("--deploy-agent"))
        .stdout(predicate::str::contains("--enable-toolchains"));
}

#[test]
fn version_flag_reports_version() {
    bootstrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootstrap"));
}

#[test]
fn missing_mode_flag_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    bootstrap()
        .args(["--distbuild-path", &dir.path().join("db").display().to_string()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--aosp-path"));
}

#[test]
fn conflicting_modes_are_rejected_before_any_side_effect() {
    let dir = TempDir::new().expect("tempdir");
    let aosp = dir.path().join("aosp");
    let db = dir.path().join("db");

    bootstrap()
        .args([
            "--aosp-path",
            &aosp.display().to_string(),
            "--deploy-agent",
            "--distbuild-path",
            &db.display().to_string(),
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));

    assert!(!aosp.exists(), "rejected run must not create directories");
    assert!(!db.exists(), "rejected run must not create directories");
}

#[test]
fn enable_toolchains_conflicts_with_deploy_agent() {
    bootstrap()
        .args([
            "--deploy-agent",
            "--enable-toolchains",
            "--distbuild-path",
            "/tmp/db",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn password_without_worker_is_rejected() {
    bootstrap()
        .args([
            "--deploy-agent",
            "--distbuild-path",
            "/tmp/db",
            "--password",
            "pw",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--worker"));
}

#[test]
fn deploy_agent_without_agent_bin_warns_and_exits_zero() {
    let dir = TempDir::new().expect("tempdir");
    let db = dir.path().join("db");

    bootstrap()
        .args(["--deploy-agent", "--distbuild-path", &db.display().to_string()])
        .env_remove("AGENT_BIN")
        .assert()
        .success()
        .stdout(predicate::str::contains("AGENT_BIN not set"));
}

#[test]
fn provisioning_with_empty_repo_host_fails_before_side_effects() {
    let dir = TempDir::new().expect("tempdir");
    let aosp = dir.path().join("aosp");
    let db = dir.path().join("db");

    // An empty environment value masks the embedded default and counts as
    // unset, so the run must abort before touching the aosp tree.
    bootstrap()
        .args([
            "--aosp-path",
            &aosp.display().to_string(),
            "--distbuild-path",
            &db.display().to_string(),
        ])
        .env("REPO_HOST", "")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("REPO_HOST not set"));

    assert!(!aosp.exists(), "failed config must not create the aosp tree");
}
