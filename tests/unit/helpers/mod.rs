//! Test helper utilities

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use fieldcat::analyzer::backend::{AgentBackend, BackendError, BackendResult};
use fieldcat::analyzer::{EventSink, Prompt, ProgressEvent, SinkClosed};
use serde_json::{json, Value};

/// Get the path to the fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load a fixture file's contents
pub fn load_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Load and parse a JSON fixture
pub fn load_json_fixture(name: &str) -> Value {
    serde_json::from_str(&load_fixture(name))
        .unwrap_or_else(|e| panic!("Fixture {} is not valid JSON: {}", name, e))
}

/// Descriptors sent in a batch prompt (the last line of the user message).
pub fn prompt_descriptors(prompt: &Prompt) -> Vec<Value> {
    let line = prompt.user.lines().last().unwrap_or_default();
    serde_json::from_str(line).unwrap_or_default()
}

/// Backend that describes every field it is sent.
///
/// Optionally fails the first `failures` calls.
pub struct EchoBackend {
    failures: Mutex<usize>,
    pub prompts: Mutex<Vec<Prompt>>,
}

impl EchoBackend {
    pub fn new() -> Self {
        Self::failing_first(0)
    }

    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures: Mutex::new(failures),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl AgentBackend for EchoBackend {
    fn name(&self) -> &'static str {
        "Echo"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn invoke(&self, prompt: &Prompt, _timeout: Duration) -> BackendResult<String> {
        self.prompts.lock().unwrap().push(prompt.clone());

        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(BackendError::ExitCode {
                code: 1,
                stderr: "transient failure".to_string(),
            });
        }

        let records: Vec<Value> = prompt_descriptors(prompt)
            .iter()
            .map(|d| {
                json!({
                    "path": d["path"],
                    "dataName": format!("Described {}", d["path"].as_str().unwrap_or("")),
                    "description": "Generated description",
                    "isImportant": true
                })
            })
            .collect();
        Ok(format!("Sure!\n```json\n{}\n```", Value::Array(records)))
    }
}

/// Backend that never produces a usable reply.
pub struct BrokenBackend;

impl AgentBackend for BrokenBackend {
    fn name(&self) -> &'static str {
        "Broken"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn invoke(&self, _prompt: &Prompt, _timeout: Duration) -> BackendResult<String> {
        Ok("I cannot help with that.".to_string())
    }
}

/// Sink whose observer goes away after accepting `capacity` events.
pub struct ClosingSink {
    remaining: usize,
    pub events: Vec<ProgressEvent>,
}

impl ClosingSink {
    pub fn after(capacity: usize) -> Self {
        Self {
            remaining: capacity,
            events: Vec::new(),
        }
    }
}

impl EventSink for ClosingSink {
    fn emit(&mut self, event: ProgressEvent) -> Result<(), SinkClosed> {
        if self.remaining == 0 {
            return Err(SinkClosed);
        }
        self.remaining -= 1;
        self.events.push(event);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.remaining > 0
    }
}

/// Stages of a list of events, in order.
pub fn stages(events: &[ProgressEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| {
            serde_json::to_value(e).unwrap()["stage"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect()
}
