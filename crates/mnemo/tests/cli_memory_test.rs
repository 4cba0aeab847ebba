//! End-to-end CLI tests for the mnemo binary.
//!
//! Each test runs against its own temp working directory via `--cd`.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::{TempDir, tempdir};

/// Get a Command for the mnemo binary pointed at `dir`.
fn mnemo(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mnemo"));
    cmd.args(["--cd", dir.path().to_str().unwrap()]);
    cmd
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn test_help_flag() {
    Command::new(env!("CARGO_BIN_EXE_mnemo"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_activate_creates_state_dir() {
    let dir = tempdir().unwrap();

    mnemo(&dir)
        .arg("activate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Activated project"));

    assert!(dir.path().join(".mnemo/project_id").is_file());
    assert!(dir.path().join(".mnemo/memories.json").is_file());
}

#[test]
fn test_activate_idempotent() {
    let dir = tempdir().unwrap();

    let first = mnemo(&dir)
        .args(["--format", "json", "activate"])
        .assert()
        .success();
    let first_id = stdout_json(&first.get_output().stdout)["project_id"]
        .as_str()
        .unwrap()
        .to_string();

    let second = mnemo(&dir)
        .args(["--format", "json", "activate"])
        .assert()
        .success();
    let second_id = stdout_json(&second.get_output().stdout)["project_id"]
        .as_str()
        .unwrap()
        .to_string();

    assert_eq!(first_id, second_id);
}

#[test]
fn test_store_get_list_update_delete_flow() {
    let dir = tempdir().unwrap();

    let stored = mnemo(&dir)
        .args([
            "--format",
            "json",
            "store",
            "--title",
            "API design",
            "--type",
            "design_doc",
            "--content",
            "# v1",
        ])
        .assert()
        .success();
    let memory_id = stdout_json(&stored.get_output().stdout)["memory_id"]
        .as_str()
        .unwrap()
        .to_string();

    mnemo(&dir)
        .args(["get", &memory_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Title: API design"))
        .stdout(predicate::str::contains("# v1"));

    mnemo(&dir)
        .args(["list", "--type", "design_doc"])
        .assert()
        .success()
        .stdout(predicate::str::contains(&memory_id))
        .stdout(predicate::str::contains("API design"));

    mnemo(&dir)
        .args(["update", &memory_id, "--content", "# v2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated memory"));

    mnemo(&dir)
        .args(["get", &memory_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("# v2"));

    mnemo(&dir)
        .args(["delete", &memory_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted memory"));

    mnemo(&dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No memories found."));
}

#[test]
fn test_store_content_from_stdin() {
    let dir = tempdir().unwrap();

    mnemo(&dir)
        .args(["store", "--title", "Notes", "--type", "analysis"])
        .write_stdin("piped body\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored memory"));

    mnemo(&dir)
        .args(["--format", "json", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Notes"));
}

#[test]
fn test_store_rejects_unknown_type() {
    let dir = tempdir().unwrap();

    mnemo(&dir)
        .args([
            "store",
            "--title",
            "T",
            "--type",
            "grocery_list",
            "--content",
            "",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("grocery_list"));
}

#[test]
fn test_store_rejects_empty_title() {
    let dir = tempdir().unwrap();

    mnemo(&dir)
        .args(["store", "--title", "", "--type", "analysis", "--content", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required field: title"));
}

#[test]
fn test_get_unknown_id_fails() {
    let dir = tempdir().unwrap();

    mnemo(&dir)
        .args(["get", "3e8e6f64-7a70-4b4f-93a1-111111111111"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Memory not found"));
}

#[test]
fn test_list_fresh_project_is_empty() {
    let dir = tempdir().unwrap();

    mnemo(&dir)
        .args(["--format", "json", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_duplicate_titles_get_distinct_ids() {
    let dir = tempdir().unwrap();

    let store_once = |content: &str| {
        let result = mnemo(&dir)
            .args([
                "--format",
                "json",
                "store",
                "--title",
                "T1",
                "--type",
                "design_doc",
                "--content",
                content,
            ])
            .assert()
            .success();
        stdout_json(&result.get_output().stdout)["memory_id"]
            .as_str()
            .unwrap()
            .to_string()
    };

    let id1 = store_once("c1");
    let id2 = store_once("c2");
    assert_ne!(id1, id2);
}
