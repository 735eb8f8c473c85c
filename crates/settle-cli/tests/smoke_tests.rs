//! Smoke tests for the settle CLI
//!
//! None of these start a browser: they cover argument handling, listing,
//! configuration output and runs whose target cannot be opened.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the settle binary
fn settle() -> Command {
    let mut cmd = Command::cargo_bin("settle").expect("settle binary should exist");
    cmd.env_remove("SETTLE_TARGET")
        .env_remove("SETTLE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    settle()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    settle()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_is_usage_error() {
    settle().assert().code(2);
}

#[test]
fn test_run_help() {
    settle()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fail-fast"))
        .stdout(predicate::str::contains("--target"));
}

// ============================================================================
// list / config
// ============================================================================

#[test]
fn test_list_shows_builtin_scenarios() {
    settle()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("focus-menu"))
        .stdout(predicate::str::contains("cutscene-then-measure"))
        .stdout(predicate::str::contains("tactics-focus"));
}

#[test]
fn test_config_prints_defaults() {
    settle()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("viewport_width: 960"))
        .stdout(predicate::str::contains("max_attempts: 10"));
}

#[test]
fn test_config_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settle.yaml");
    fs::write(&path, "wait:\n  timeout_ms: 2500\n").unwrap();
    settle()
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout_ms: 2500"));
}

#[test]
fn test_config_invalid_file_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settle.yaml");
    fs::write(&path, "wait:\n  poll_interval_ms: 0\n").unwrap();
    settle()
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("poll_interval_ms"));
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_without_target_is_usage_error() {
    settle()
        .args(["run", "ui-layout"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("target"));
}

#[test]
fn test_run_unknown_scenario_is_usage_error() {
    let dir = TempDir::new().unwrap();
    settle()
        .args(["run", "no-such-scenario", "--target", "index.html", "--output"])
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no-such-scenario"));
    assert!(!dir.path().join("report.json").exists());
}

#[test]
fn test_run_missing_target_file_errors_and_writes_report() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.html");
    let out = dir.path().join("out");
    settle()
        .args(["--color", "never", "run", "ui-layout", "--target"])
        .arg(&missing)
        .arg("--output")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ui-layout"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(report["errored"], 1);
    assert_eq!(report["scenarios"][0]["verdict"], "error");
}

#[test]
fn test_run_json_format_prints_report() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.html");
    let assert = settle()
        .args(["-q", "run", "system-init", "--format", "json", "--target"])
        .arg(&missing)
        .arg("--output")
        .arg(dir.path())
        .assert()
        .code(1);
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["scenarios"][0]["name"], "system-init");
}
