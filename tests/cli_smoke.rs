//! Runs the compiled binary with stand-in engine programs
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn run_cli(root: &Path, extra: &[&str]) -> Output {
    let bin_path = std::env::var("CARGO_BIN_EXE_stacklint")
        .unwrap_or_else(|_| "target/debug/stacklint".to_string());

    Command::new(bin_path)
        .arg("--root")
        .arg(root)
        .args(extra)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run stacklint")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn clean_run_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.yaml"), "Key: {{ val }}").unwrap();

    let output = run_cli(dir.path(), &["--engine", "true", "--var", "val=1"]);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
    assert!(stdout(&output).contains("0 errors"));
}

#[test]
fn variables_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.yaml"), "Key: {{ val }}").unwrap();

    let bin_path = std::env::var("CARGO_BIN_EXE_stacklint")
        .unwrap_or_else(|_| "target/debug/stacklint".to_string());
    let output = Command::new(bin_path)
        .env("STACKLINT_ROOT", dir.path())
        .env("STACKLINT_ENGINE", "true")
        .env("STACKLINT_VAR_VAL", "1")
        .output()
        .expect("Failed to run stacklint");
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
}

#[test]
fn broken_engine_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.yaml"), "Key: value").unwrap();

    let output = run_cli(dir.path(), &["--engine", "false"]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("[engine]"), "stdout: {}", text);
    assert!(text.contains("FAIL"));
}

#[test]
fn render_failure_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.yaml"), "Key: {{ missing }}").unwrap();
    fs::write(dir.path().join("b.yaml"), "Key: value").unwrap();

    let output = run_cli(dir.path(), &["--engine", "true"]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("a.yaml:1:"), "stdout: {}", text);
    assert!(text.contains("error [render]"), "stdout: {}", text);
    assert!(text.contains("in 2 documents"));
}

#[test]
fn misconfiguration_has_its_own_exit_code() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(dir.path(), &["--engine", "true", "--threshold", "fatal"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid severity threshold"));

    let output = run_cli(dir.path(), &["--engine", "true", "missing.yaml"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn json_report() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.yaml"), "Key: value").unwrap();

    let output = run_cli(dir.path(), &["--engine", "true", "--format", "json"]);
    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_str(&stdout(&output)).expect("json report");
    assert_eq!(report["passed"], true);
    assert_eq!(report["summary"]["documents"], 1);
    assert_eq!(report["diagnostics"].as_array().map(Vec::len), Some(0));
}
