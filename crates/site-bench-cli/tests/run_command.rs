// crates/site-bench-cli/tests/run_command.rs
// ============================================================================
// Module: CLI Run Command Tests
// Description: Integration tests driving the site-bench binary end to end.
// Purpose: Ensure runs persist results and leave the component set untouched.
// Dependencies: site-bench binary, serde_json, tempfile
// ============================================================================
//! ## Overview
//! Runs the binary against a temporary config and `SQLite` store, checking
//! JSON output, persisted results, and component restoration.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn site_bench_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_site-bench"))
}

fn write_config(root: &Path) -> PathBuf {
    let config_path = root.join("site-bench.toml");
    let store_path = root.join("bench.sqlite");
    let config = format!(
        r#"
[store]
path = {store:?}

[audit]
sink = "none"

[workloads.compute]
math_iterations = 100
hash_count = 10
string_operations = 10
sort_array_size = 100
fibonacci_repeats = 10

[workloads.memory]
element_count = 100

[workloads.storage_read]
point_lookups = 5
option_reads = 5
scan_size = 5

[workloads.storage_write]
option_round_trips = 5
table_rows = 5

[[profiles]]
id = "quick"
name = "Quick"
tests = ["cpu", "memory"]
components = []
"#,
        store = store_path.display().to_string()
    );
    fs::write(&config_path, config.trim()).expect("write config");
    config_path
}

fn run_bin(config: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(site_bench_bin());
    command.args(args).arg("--config").arg(config);
    command.output().expect("run site-bench")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies a saved run reports JSON, persists, and restores components.
#[test]
fn run_persists_result_and_restores_components() {
    let root = TempDir::new().expect("temp dir");
    let config = write_config(root.path());

    stdout_of(&run_bin(&config, &["components", "register", "--id", "site-bench", "--active"]));
    stdout_of(&run_bin(&config, &["components", "register", "--id", "cache"]));
    stdout_of(&run_bin(&config, &["seed", "--rows", "10"]));

    let output = stdout_of(&run_bin(
        &config,
        &[
            "run",
            "--test",
            "compute",
            "--test",
            "storage_read",
            "--test",
            "storage_write",
            "--component",
            "cache",
            "--format",
            "json",
        ],
    ));
    let value: serde_json::Value = serde_json::from_str(&output).expect("json output");
    let saved_id = value["saved"]["id"].as_str().expect("saved id").to_string();
    assert_eq!(value["result"]["per_test"].as_array().map(Vec::len), Some(3));

    let listed = stdout_of(&run_bin(&config, &["results", "list"]));
    assert!(listed.contains(&saved_id), "unexpected results: {listed}");

    let components = stdout_of(&run_bin(&config, &["components", "list"]));
    assert!(components.contains("cache\tinactive"), "unexpected components: {components}");
    assert!(components.contains("site-bench\tactive"), "unexpected components: {components}");
}

/// Verifies profiles select tests and `--no-save` skips persistence.
#[test]
fn profile_run_without_save_leaves_no_result() {
    let root = TempDir::new().expect("temp dir");
    let config = write_config(root.path());

    let output = stdout_of(&run_bin(&config, &["run", "--profile", "quick", "--no-save"]));
    assert!(output.contains("Compute"), "unexpected output: {output}");
    assert!(output.contains("Memory"), "unexpected output: {output}");
    assert!(!output.contains("Saved as"), "unexpected output: {output}");

    let listed = stdout_of(&run_bin(&config, &["results", "list"]));
    assert!(listed.trim().is_empty(), "unexpected results: {listed}");
}

/// Verifies unknown tests are rejected before any work starts.
#[test]
fn run_rejects_unknown_test_kind() {
    let root = TempDir::new().expect("temp dir");
    let config = write_config(root.path());

    let output = run_bin(&config, &["run", "--test", "gpu"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid benchmark request"), "unexpected stderr: {stderr}");
}

/// Verifies restore with nothing pending succeeds.
#[test]
fn restore_without_pending_record_succeeds() {
    let root = TempDir::new().expect("temp dir");
    let config = write_config(root.path());

    let output = stdout_of(&run_bin(&config, &["restore", "--format", "json"]));
    let value: serde_json::Value = serde_json::from_str(&output).expect("json output");
    assert_eq!(value["restored"], serde_json::Value::Bool(false));
}

/// Verifies the example config validates.
#[test]
fn config_example_validates() {
    let root = TempDir::new().expect("temp dir");
    let example = stdout_of(
        &Command::new(site_bench_bin()).args(["config", "example"]).output().expect("run"),
    );
    let path = root.path().join("example.toml");
    fs::write(&path, example).expect("write example");
    let output = stdout_of(&run_bin(&path, &["config", "validate"]));
    assert!(output.contains("2 profiles"), "unexpected output: {output}");
}
