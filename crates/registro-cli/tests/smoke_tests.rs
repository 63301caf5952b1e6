//! Smoke tests for the registrador CLI
//!
//! These run the real binary against a temporary artifacts root.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the registrador binary
fn registrador() -> Command {
    let mut cmd = Command::cargo_bin("registrador").expect("registrador binary should exist");
    cmd.env_remove("REGISTRO_ARTIFACTS_ROOT").env_remove("RUST_LOG");
    cmd
}

/// Command rooted at `dir` with a fixed artifacts path
fn rooted(dir: &TempDir) -> Command {
    let mut cmd = registrador();
    cmd.arg("--artifacts-root")
        .arg(dir.path())
        .arg("--artifacts-path")
        .arg("{artifacts-root}/run");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    registrador()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    registrador()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_no_args_fails() {
    registrador().assert().failure();
}

// ============================================================================
// Template Resolution
// ============================================================================

#[test]
fn test_resolve_variable() {
    registrador()
        .args(["resolve", "start_{key1}_end", "--var", "key1=val1"])
        .assert()
        .success()
        .stdout("start_val1_end\n");
}

#[test]
fn test_resolve_test_name() {
    registrador()
        .args(["--test-name", "Checkout works", "resolve", "start_{test-name}_end"])
        .assert()
        .success()
        .stdout("start_Checkout works_end\n");
}

#[test]
fn test_resolve_missing_key_fails() {
    registrador()
        .args(["resolve", "start_{missingkey}_end"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missingkey"));
}

// ============================================================================
// Artifacts
// ============================================================================

#[test]
fn test_add_text_artifact() {
    let temp_dir = TempDir::new().unwrap();
    rooted(&temp_dir)
        .args(["add", "a/b/c.txt", "--text", "nested"])
        .assert()
        .success()
        .stdout(predicate::str::contains("c.txt"));

    let written = temp_dir.path().join("run/a/b/c.txt");
    assert_eq!(fs::read_to_string(written).unwrap(), "nested");
}

#[test]
fn test_add_from_stdin() {
    let temp_dir = TempDir::new().unwrap();
    rooted(&temp_dir)
        .args(["add", "stdin.log"])
        .write_stdin("piped content")
        .assert()
        .success();

    let written = temp_dir.path().join("run/stdin.log");
    assert_eq!(fs::read_to_string(written).unwrap(), "piped content");
}

#[test]
fn test_add_json_event() {
    let temp_dir = TempDir::new().unwrap();
    rooted(&temp_dir)
        .args([
            "add", "f/g.txt", "--text", "123", "--type", "art type", "--title", "art title",
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"relative_file_path\": \"f/g.txt\""))
        .stdout(predicate::str::contains("\"artifact_type\": \"art type\""))
        .stdout(predicate::str::contains("\"artifact_title\": \"art title\""));
}

#[test]
fn test_add_empty_path_fails_without_writing() {
    let temp_dir = TempDir::new().unwrap();
    rooted(&temp_dir)
        .args(["add", "/", "--text", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be null or empty"));

    assert!(!temp_dir.path().join("run").exists());
}

#[test]
fn test_add_then_check_across_runs_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    registrador()
        .arg("--artifacts-root")
        .arg(temp_dir.path())
        .args([
            "add",
            "logs/{test-name-sanitized}",
            "--extension",
            "log",
            "--text",
            "line",
            "--test-name",
            "Login",
        ])
        .assert()
        .success();

    std::thread::sleep(std::time::Duration::from_millis(1100));
    registrador()
        .arg("--artifacts-root")
        .arg(temp_dir.path())
        .args(["check", "logs/Login.log"])
        .assert()
        .success();
    assert!(temp_dir.path().join("logs/Login.log").is_file());
}

#[test]
fn test_check_outside_artifacts_fails() {
    let temp_dir = TempDir::new().unwrap();
    rooted(&temp_dir)
        .args(["check", "../registro.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not leave the artifacts directory"));
}

#[test]
fn test_check_existing_and_missing() {
    let temp_dir = TempDir::new().unwrap();
    rooted(&temp_dir)
        .args(["add", "dir1/file.txt", "--text", "x"])
        .assert()
        .success();

    rooted(&temp_dir)
        .args(["check", "dir1/file.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"Artifacts.Directories["dir1"].Files["file.txt"] exists"#,
        ));

    rooted(&temp_dir)
        .args(["check", "dir1/other.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_variables() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("registro.yaml");
    fs::write(&config, "variables:\n  env: staging\n").unwrap();

    registrador()
        .arg("--config")
        .arg(&config)
        .args(["resolve", "{env}"])
        .assert()
        .success()
        .stdout("staging\n");
}

#[test]
fn test_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("registro.yaml");
    fs::write(&config, "not_a_field: 1\n").unwrap();

    registrador()
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML error"));
}
