//! Integration tests for the CLI interface
//!
//! Only paths that fail or finish before any real network traffic.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn polbatch() -> Command {
    let mut cmd = Command::cargo_bin("polbatch").unwrap();
    for var in ["OKAPI_URL", "OKAPI_TENANT", "OKAPI_USERNAME", "OKAPI_PASSWORD", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_cli_help_flag() {
    polbatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("set-fund"))
        .stdout(predicate::str::contains("move-fund"))
        .stdout(predicate::str::contains("clear-location"));
}

#[test]
fn test_move_fund_help() {
    polbatch()
        .args(["move-fund", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fiscal-year"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_invalid_command() {
    polbatch()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_missing_config_file_exits_2() {
    let temp = TempDir::new().unwrap();
    polbatch()
        .current_dir(temp.path())
        .args(["-C", "missing.toml", "set-fund"])
        .write_stdin("10001-1,HIST\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn test_incomplete_config_exits_2() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("partial.toml");
    std::fs::write(&config, "[okapi]\nurl = \"http://127.0.0.1:1\"\n").unwrap();
    polbatch()
        .arg("-C")
        .arg(&config)
        .arg("set-fund")
        .write_stdin("10001-1,HIST\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("tenant_id"));
}

#[test]
fn test_malformed_mapping_aborts_before_login() {
    let temp = TempDir::new().unwrap();
    let config = common::write_config(temp.path(), "http://127.0.0.1:1");
    polbatch()
        .arg("-C")
        .arg(&config)
        .arg("set-fund")
        .write_stdin("10001-1,HIST\n10002-1\n")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("line 2"))
        .stderr(predicate::str::contains("Logging in").not());
}

#[test]
fn test_conflicting_mapping_aborts() {
    let temp = TempDir::new().unwrap();
    let config = common::write_config(temp.path(), "http://127.0.0.1:1");
    polbatch()
        .arg("-C")
        .arg(&config)
        .args(["move-fund", "--in-dialect", "excel-tab"])
        .write_stdin("10001-1\tHIST\n10001-1\tGEN\n")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("already mapped"));
}

#[test]
fn test_unreachable_okapi_exits_4() {
    let temp = TempDir::new().unwrap();
    let config = common::write_config(temp.path(), "http://127.0.0.1:1");
    polbatch()
        .arg("-C")
        .arg(&config)
        .arg("set-fund")
        .write_stdin("10001-1,HIST\n")
        .assert()
        .code(4);
}

#[test]
fn test_unknown_barcode_column_exits_5() {
    let temp = TempDir::new().unwrap();
    let config = common::write_config(temp.path(), "http://127.0.0.1:1");
    polbatch()
        .arg("-C")
        .arg(&config)
        .args(["clear-location", "--barcode-field", "Barcode"])
        .write_stdin("Item,Title\n3901,Some book\n")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Barcode"));
}
