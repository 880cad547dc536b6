//! Common utilities for CLI tests.
#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

/// Invoke the CLI against `data_dir` and return (stdout, stderr, code).
pub fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_logged(data_dir, "off", args)
}

/// Like [`run_cli`] with `RUST_LOG` set to `filter`.
pub fn run_cli_logged(data_dir: &Path, filter: &str, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_daybell"))
        .args(["--platform", "web-fallback"])
        .args(args)
        .env("DAYBELL_DATA_DIR", data_dir)
        .env("RUST_LOG", filter)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Invoke a CLI command and expect success.
pub fn run_cli_success(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command failed with code {code}: {args:?}\n{stderr}");
    stdout
}

/// Invoke a CLI command and expect failure.
pub fn run_cli_failure(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert!(code != 0, "CLI command unexpectedly succeeded: {args:?}");
    (stdout, stderr, code)
}

/// Parse JSON output from CLI.
pub fn parse_json<T: for<'de> serde::Deserialize<'de>>(json: &str) -> T {
    serde_json::from_str(json).expect("Failed to parse JSON output")
}

/// Id printed on the first line by `task add`.
pub fn created_id(stdout: &str) -> String {
    stdout
        .lines()
        .next()
        .and_then(|l| l.strip_prefix("Task created: "))
        .expect("missing 'Task created:' line")
        .to_string()
}

pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(haystack.contains(needle), "Expected '{haystack}' to contain '{needle}'");
}
