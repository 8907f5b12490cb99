//! End-to-end tests of `fieldcat analyze` with a scripted command agent

use predicates::prelude::*;

use crate::helpers::{path_str, records, TestEnv};

#[test]
fn empty_input_ends_with_error_event() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args(["analyze", "-", "--quiet"])
        .write_stdin("")
        .output()
        .unwrap();
    assert!(!output.status.success());

    let events = records(&output.stdout);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "error");
    assert_eq!(events[0]["data"]["message"], "No JSON data provided");
}

#[test]
fn invalid_json_ends_with_error_event() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args(["analyze", "-", "--quiet"])
        .write_stdin("{\"a\": ")
        .output()
        .unwrap();
    assert!(!output.status.success());

    let events = records(&output.stdout);
    assert_eq!(events.last().unwrap()["event"], "error");
}

#[test]
fn unknown_agent_flag_fails_before_streaming() {
    let env = TestEnv::new();
    env.cmd()
        .args(["analyze", "-", "--agent", "copilot"])
        .write_stdin("{}")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Unknown agent"));
}

#[test]
fn zero_timeout_flag_fails_before_streaming() {
    let env = TestEnv::new();
    env.cmd()
        .args(["analyze", "-", "--timeout", "0"])
        .write_stdin("{\"a\": 1}")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("analysis.timeout must be > 0"));
}

#[test]
fn unavailable_command_agent_is_an_error_event() {
    let env = TestEnv::new();
    env.write_config(
        r#"
[analysis]
agent = "command"

[command]
program = ["/nonexistent/fieldcat-agent"]
"#,
    );
    let output = env
        .cmd()
        .args(["analyze", "-", "--quiet"])
        .write_stdin(r#"{"a": 1}"#)
        .output()
        .unwrap();
    assert!(!output.status.success());

    let events = records(&output.stdout);
    assert_eq!(events.len(), 1);
    assert!(events[0]["data"]["message"]
        .as_str()
        .unwrap()
        .contains("[command] program"));
}

#[cfg(unix)]
#[test]
fn scripted_agent_describes_fields() {
    let env = TestEnv::new();
    let reply = env.write_file(
        "reply.json",
        r#"[{"fieldName": "value", "dataName": "Value", "description": "A described value", "isImportant": true}]"#,
    );
    env.use_shell_agent(&format!("cat > /dev/null; cat '{}'", path_str(&reply)));

    let output = env
        .cmd()
        .args(["analyze", "-", "--quiet"])
        .write_stdin(r#"{"price": 10.5, "currency": "USD"}"#)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let events = records(&output.stdout);
    let complete = events.last().unwrap();
    assert_eq!(complete["event"], "complete");

    let results = complete["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["path"], "price");
    assert_eq!(results[1]["path"], "currency");
    assert!(results.iter().all(|r| r["dataName"] == "Value"));
    assert_eq!(complete["data"]["usage"]["describedBatches"], 2);
}

#[cfg(unix)]
#[test]
fn failing_agent_falls_back_to_templates() {
    let env = TestEnv::new();
    env.use_shell_agent("cat > /dev/null; echo 'model overloaded' >&2; exit 3");

    let output = env
        .cmd()
        .args(["analyze", "-", "--quiet"])
        .write_stdin(r#"{"order": {"id": 42, "paid": false}}"#)
        .output()
        .unwrap();
    assert!(output.status.success());

    let events = records(&output.stdout);
    let complete = events.last().unwrap();
    assert_eq!(complete["event"], "complete");
    assert_eq!(complete["data"]["usage"]["fallbackBatches"], 1);

    let results = complete["data"]["results"].as_array().unwrap();
    assert_eq!(results[1]["path"], "order.paid");
    assert_eq!(results[1]["description"], "boolean field");
    assert_eq!(results[1]["isImportant"], false);
}

#[cfg(unix)]
#[test]
fn sse_format_frames_every_event() {
    let env = TestEnv::new();
    env.use_shell_agent("cat > /dev/null; exit 1");

    let output = env
        .cmd()
        .args(["analyze", "-", "--quiet", "--format", "sse"])
        .write_stdin(r#"{"a": 1}"#)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let frames: Vec<&str> = stdout.split("\n\n").filter(|f| !f.is_empty()).collect();
    assert!(frames.len() >= 5);
    assert!(frames.iter().all(|f| f.starts_with("data: {\"event\":")));
    assert!(frames.last().unwrap().contains("\"event\":\"complete\""));
}

#[cfg(unix)]
#[test]
fn progress_view_goes_to_stderr() {
    let env = TestEnv::new();
    env.use_shell_agent("cat > /dev/null; exit 1");

    env.cmd()
        .args(["analyze", "-"])
        .write_stdin(r#"{"a": 1}"#)
        .assert()
        .success()
        .stderr(predicate::str::contains("Catalogued 1 field in"));
}
