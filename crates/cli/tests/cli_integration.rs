//! CLI integration tests against the local JSON file store.
//!
//! Every test gets its own temporary directory and points `--store` at a
//! file inside it, so tests never touch a shared store.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RECORD_A: &str = r#"{
    "label": "run001",
    "timestamp": "2024-02-01 09:00:00",
    "tags": ["baseline"],
    "reason": "first try",
    "status": "finished",
    "outcome": "converged"
}"#;

const RECORDS_BC: &str = r#"[
    {"label": "run002", "timestamp": "2024-02-02 09:00:00", "tags": ["nightly"]},
    {"label": "run003", "timestamp": "2024-01-15 09:00:00", "tags": ["nightly", "baseline"]}
]"#;

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("records.json")
}

/// Helper: a `provstore` command bound to the store in `dir`.
fn provstore(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("provstore");
    cmd.current_dir(dir.path())
        .env_remove("PROVSTORE_URI")
        .env_remove("PROVSTORE_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--store")
        .arg(store_path(dir));
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

fn seeded() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let a = write(dir.path(), "a.json", RECORD_A);
    let bc = write(dir.path(), "bc.json", RECORDS_BC);
    provstore(&dir).args(["import", "proj1"]).arg(&a).assert().success();
    provstore(&dir).args(["import", "proj1"]).arg(&bc).assert().success();
    dir
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    cargo_bin_cmd!("provstore")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provenance record store client"));
}

#[test]
fn version_exits_0() {
    cargo_bin_cmd!("provstore")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("provstore"));
}

// ──────────────────────────────────────────────
// 2. Projects
// ──────────────────────────────────────────────

#[test]
fn create_project_then_info() {
    let dir = TempDir::new().unwrap();
    provstore(&dir)
        .args(["create-project", "alpha", "--long-name", "Alpha project"])
        .args(["--description", "first"])
        .assert()
        .success();
    provstore(&dir)
        .arg("projects")
        .assert()
        .success()
        .stdout("alpha\n");
    provstore(&dir)
        .args(["info", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: Alpha project"))
        .stdout(predicate::str::contains("description: first"));
}

#[test]
fn update_project_changes_info() {
    let dir = TempDir::new().unwrap();
    provstore(&dir).args(["create-project", "alpha"]).assert().success();
    provstore(&dir)
        .args(["update-project", "alpha", "--long-name", "Renamed", "--description", "new"])
        .assert()
        .success();
    let out = provstore(&dir)
        .args(["--output", "json", "info", "alpha"])
        .output()
        .unwrap();
    let info: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(info["name"], "Renamed");
    assert_eq!(info["description"], "new");
}

#[test]
fn info_of_unknown_project_fails() {
    let dir = TempDir::new().unwrap();
    provstore(&dir)
        .args(["info", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

// ──────────────────────────────────────────────
// 3. Records
// ──────────────────────────────────────────────

#[test]
fn import_then_list_in_timestamp_order() {
    let dir = seeded();
    provstore(&dir)
        .args(["list", "proj1"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("(?s)run003.*run001.*run002").unwrap());
}

#[test]
fn list_filters_by_tag() {
    let dir = seeded();
    let out = provstore(&dir)
        .args(["--output", "json", "list", "proj1", "--tag", "nightly"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let records: Vec<serde_json::Value> = serde_json::from_slice(&out.stdout).unwrap();
    let labels: Vec<&str> = records.iter().map(|r| r["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["run003", "run002"]);
}

#[test]
fn show_prints_the_record() {
    let dir = seeded();
    provstore(&dir)
        .args(["show", "proj1", "run001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timestamp: 2024-02-01 09:00:00"))
        .stdout(predicate::str::contains("outcome: converged"));
}

#[test]
fn show_missing_record_fails() {
    let dir = seeded();
    provstore(&dir)
        .args(["show", "proj1", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no record labelled 'nope'"));
}

#[test]
fn latest_is_by_timestamp() {
    let dir = seeded();
    provstore(&dir)
        .args(["latest", "proj1"])
        .assert()
        .success()
        .stdout("run002\n");
}

#[test]
fn delete_and_delete_tag() {
    let dir = seeded();
    provstore(&dir).args(["delete", "proj1", "run001"]).assert().success();
    provstore(&dir)
        .args(["delete-tag", "proj1", "nightly"])
        .assert()
        .success()
        .stdout("2\n");
    provstore(&dir)
        .args(["list", "proj1"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn export_is_a_json_array() {
    let dir = seeded();
    let out = provstore(&dir).args(["export", "proj1"]).output().unwrap();
    assert!(out.status.success());
    let records: Vec<serde_json::Value> = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(records.len(), 3);
}

#[test]
fn import_rejects_invalid_records() {
    let dir = TempDir::new().unwrap();
    let bad = write(dir.path(), "bad.json", r#"{"label": "x", "timestamp": "not a time"}"#);
    provstore(&dir)
        .args(["import", "proj1"])
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid record"));
}

// ──────────────────────────────────────────────
// 4. Sync, maintenance and backend selection
// ──────────────────────────────────────────────

#[test]
fn sync_copies_from_another_local_store() {
    let source = seeded();
    let dir = TempDir::new().unwrap();
    provstore(&dir)
        .args(["sync", "proj1", "--from"])
        .arg(store_path(&source))
        .assert()
        .success()
        .stdout("proj1: 3 record(s) copied\n");
    provstore(&dir)
        .args(["latest", "proj1"])
        .assert()
        .success()
        .stdout("run002\n");
}

#[test]
fn sync_all_copies_every_project() {
    let source = seeded();
    let extra = write(source.path(), "extra.json", RECORD_A);
    provstore(&source).args(["import", "proj2"]).arg(&extra).assert().success();

    let dir = TempDir::new().unwrap();
    provstore(&dir)
        .args(["sync", "--all", "--from"])
        .arg(store_path(&source))
        .assert()
        .success();
    provstore(&dir)
        .arg("projects")
        .assert()
        .success()
        .stdout("proj1\nproj2\n");
}

#[test]
fn sync_needs_a_project_or_all() {
    let dir = TempDir::new().unwrap();
    provstore(&dir)
        .args(["sync", "--from", "other.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--all"));
}

#[test]
fn clear_requires_confirmation() {
    let dir = seeded();
    provstore(&dir).arg("clear").assert().failure();
    provstore(&dir).args(["clear", "--yes"]).assert().success();
    provstore(&dir).arg("projects").assert().success().stdout("");
}

#[test]
fn backup_writes_a_copy() {
    let dir = seeded();
    provstore(&dir).arg("backup").assert().success();
    let backups = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".bak"))
        .count();
    assert_eq!(backups, 1);
}

#[test]
fn backend_selection() {
    let dir = TempDir::new().unwrap();
    provstore(&dir)
        .args(["backend", "http://store.example/"])
        .assert()
        .success()
        .stdout("rest\n");
    provstore(&dir)
        .args(["backend", "http://h:8080/api/private/K/T/"])
        .assert()
        .success()
        .stdout("envelope\n");
    provstore(&dir)
        .args(["backend", "records.json"])
        .assert()
        .success()
        .stdout("local\n");
}

#[test]
fn envelope_hosts_come_from_the_environment() {
    let dir = TempDir::new().unwrap();
    provstore(&dir)
        .env("PROVSTORE_ENVELOPE_HOSTS", "managed.example")
        .args(["backend", "https://managed.example/x/"])
        .assert()
        .success()
        .stdout("envelope\n");
}

#[test]
fn json_errors_on_stderr() {
    let dir = TempDir::new().unwrap();
    let out = provstore(&dir)
        .args(["--output", "json", "latest", "ghost"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    let last = stderr.lines().filter(|l| !l.trim().is_empty()).last().unwrap();
    let err: serde_json::Value = serde_json::from_str(last).unwrap();
    assert!(err["error"].as_str().unwrap().contains("ghost"));
}
