//! CLI tests for the structural commands

use predicates::prelude::*;

use crate::helpers::{fixture_path, path_str, TestEnv};

// ============================================
// Help and config
// ============================================

#[test]
fn help_lists_commands() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("flatten"))
        .stdout(predicate::str::contains("schema"));
}

#[test]
fn config_path_is_under_home() {
    let env = TestEnv::new();
    env.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".config/fieldcat/config.toml"));
}

#[test]
fn config_init_then_show() {
    let env = TestEnv::new();
    env.cmd().args(["config", "init"]).assert().success();
    assert!(env.config_path().exists());

    env.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[analysis]"))
        .stdout(predicate::str::contains("batch_size = 40"));
}

#[test]
fn invalid_config_is_reported() {
    let env = TestEnv::new();
    env.write_config("[analysis]\nagent = \"copilot\"\n");
    env.cmd()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown agent 'copilot'"));
}

// ============================================
// flatten / chunk / schema
// ============================================

#[test]
fn flatten_prints_fields_and_stats() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args(["flatten", path_str(&fixture_path("quote_response.json"))])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = value["items"].as_array().unwrap();
    assert_eq!(items.len(), 15);
    assert_eq!(items[0]["path"], "status");
    assert_eq!(items[0]["type"], "string");
    assert_eq!(value["stats"]["flattenedCount"], 16);
}

#[test]
fn flatten_grouped_reads_stdin() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args(["flatten", "-", "--grouped", "--include-meta"])
        .write_stdin(r#"{"rows": [{"id": 1}, {"id": 2}], "count": 2}"#)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let groups = value["groups"].as_array().unwrap();
    assert_eq!(groups[0]["rootKey"], "rows");
    assert_eq!(groups[0]["items"][1]["path"], "rows._length");
    assert_eq!(groups[1]["rootKey"], "count");
}

#[test]
fn flatten_missing_file_fails() {
    let env = TestEnv::new();
    env.cmd()
        .args(["flatten", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn schema_prints_overview() {
    let env = TestEnv::new();
    env.cmd()
        .args(["schema", path_str(&fixture_path("quote_response.json"))])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Root Type: object"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn chunk_prints_json_result() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args(["chunk", path_str(&fixture_path("quote_response.json"))])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["chunks"][0]["type"], "root");
    assert!(value["stats"]["totalChunks"].as_u64().unwrap() >= 3);
}
