//! End-to-end tests of the `cellscope` binary.

#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const MODEL: &str = r#"{
  "sheets": [
    { "name": "Inputs", "formulas": [["Rate", 0.05], ["Units", 120]] },
    { "name": "Calc", "formulas": [
        ["=Inputs!B2*10", "=A1*(1+Inputs!B1)"],
        ["=SUM(A1:B1)", "=Ghost!A1"]
    ] }
  ]
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

fn cellscope() -> Command {
    let mut cmd = Command::cargo_bin("cellscope").expect("binary");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_commands() {
    cellscope()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("flow"));
}

#[test]
fn test_parse_prints_tree() {
    cellscope()
        .args(["parse", "=IF(A1>0,\"yes\",\"no\")", "-a", "TRUE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fn IF"))
        .stdout(predicate::str::contains("[active]"));
}

#[test]
fn test_refs_json() {
    let output = cellscope()
        .args(["refs", "=Sheet1!A1+$B$2:C3", "--format", "json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["normalized"], "=REF+REF");
    assert_eq!(json["resolved"][1], "Sheet1!B2:C3");
}

#[test]
fn test_graph_warns_about_unresolved_cells() {
    let dir = TempDir::new().expect("tempdir");
    let book = write(&dir, "model.json", MODEL);
    cellscope()
        .arg("graph")
        .arg(&book)
        .args(["--scope", "Calc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Calc!A1 =Inputs!B2*10"))
        .stderr(predicate::str::contains("1 cells could not be fully analyzed"));
}

#[test]
fn test_trace_dependents() {
    let dir = TempDir::new().expect("tempdir");
    let book = write(&dir, "model.json", MODEL);
    cellscope()
        .arg("trace")
        .arg(&book)
        .args(["inputs!B2", "--dependents"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Inputs!B2\n  Calc!A1\n"))
        .stdout(predicate::str::contains("    Calc!B1"));
}

#[test]
fn test_flow_groups() {
    let dir = TempDir::new().expect("tempdir");
    let book = write(&dir, "model.json", MODEL);
    cellscope()
        .arg("flow")
        .arg(&book)
        .assert()
        .success()
        .stdout(predicate::str::contains("input (1)\n  Calc!A1"))
        .stdout(predicate::str::contains("output (1)\n  Calc!B1"))
        .stdout(predicate::str::contains("orphan (2)\n  Calc!A2\n  Calc!B2"));
}

#[test]
fn test_flow_highlights_use_color_override() {
    let dir = TempDir::new().expect("tempdir");
    let book = write(&dir, "model.json", MODEL);
    let config = write(&dir, "settings.yaml", "palette:\n  output: \"#123456\"\n");
    cellscope()
        .arg("flow")
        .arg(&book)
        .arg("--config")
        .arg(&config)
        .args(["--highlights", "-C", "input=#00ff00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#00FF00"))
        .stdout(predicate::str::contains("#123456"));
}

#[test]
fn test_compare_ignoring_reference_only_changes() {
    let dir = TempDir::new().expect("tempdir");
    let before = write(
        &dir,
        "before.json",
        r#"{"sheets":[{"name":"S","formulas":[["=B1+B2", 1]]}]}"#,
    );
    let after = write(
        &dir,
        "after.json",
        r#"{"sheets":[{"name":"S","formulas":[["=B1+B3", 1]]}]}"#,
    );

    cellscope()
        .arg("compare")
        .arg(&before)
        .arg(&after)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 differences in 1 blocks"))
        .stdout(predicate::str::contains("A1: \"=B1+B2\" -> \"=B1+B3\""));

    cellscope()
        .arg("compare")
        .arg(&before)
        .arg(&after)
        .arg("--ignore-references")
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences"));
}

#[test]
fn test_missing_sheet_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let book = write(&dir, "model.json", MODEL);
    cellscope()
        .arg("graph")
        .arg(&book)
        .args(["--scope", "Nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nowhere"));
}

#[test]
fn test_missing_file_is_an_error() {
    cellscope()
        .args(["patterns", "does-not-exist.json", "Sheet1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load workbook"));
}
