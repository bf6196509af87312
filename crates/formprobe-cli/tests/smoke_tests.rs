//! Smoke tests for the formprobe CLI
//!
//! Only commands that need no browser are exercised here.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the formprobe binary, isolated from any config file
/// in the working directory
fn formprobe(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("formprobe").expect("formprobe binary should exist");
    cmd.current_dir(dir.path()).env_remove("FORMPROBE_CONFIG").env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("catalog"));
}

#[test]
fn test_no_args_fails() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir).assert().failure();
}

// ============================================================================
// list
// ============================================================================

#[test]
fn test_list_prints_standard_suite() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("amount/enter-amount"))
        .stdout(predicate::str::contains("amount/retain-on-reload"))
        .stdout(predicate::str::contains("contact/director-prefill"));
}

#[test]
fn test_list_filter() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .args(["list", "--filter", "contact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("contact/company-details"))
        .stdout(predicate::str::contains("amount/").not());
}

// ============================================================================
// generate
// ============================================================================

#[test]
fn test_generate_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let first = formprobe(&dir).args(["generate", "--seed", "42", "-n", "2"]).output().unwrap();
    let second = formprobe(&dir).args(["generate", "--seed", "42", "-n", "2"]).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let document: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    assert_eq!(document["seed"], 42);
    assert_eq!(document["payloads"].as_array().unwrap().len(), 2);
    assert_eq!(document["payloads"][0]["dropdowns"].as_array().unwrap().len(), 4);
}

#[test]
fn test_generate_uses_config_seed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("formprobe.yaml"), "seed: 7\n").unwrap();
    formprobe(&dir)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"seed\": 7"));
}

// ============================================================================
// catalog
// ============================================================================

#[test]
fn test_builtin_catalog_prints() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("loanPeriods"))
        .stdout(predicate::str::contains("Fixed rate loan"));
}

#[test]
fn test_catalog_with_empty_options_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.yaml");
    fs::write(
        &path,
        "loanPeriodDropdown: {field: loanPeriods, options: []}\n\
         annualTurnoverDropdown: {field: companyRevenue, options: [a]}\n\
         loanDeadlineDropdown: {field: loanDeadline, options: [b]}\n\
         loanGoalDropdown: {field: loanGoal, options: [c]}\n",
    )
    .unwrap();
    formprobe(&dir)
        .args(["catalog", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("formprobe.yaml"), "seed: [").unwrap();
    formprobe(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
