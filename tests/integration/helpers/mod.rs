//! Helpers for running the fieldcat binary in an isolated home directory

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Path of a file under tests/fixtures
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A temporary HOME so the user's real config is never read.
pub struct TestEnv {
    pub home: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp home"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.home
            .path()
            .join(".config")
            .join("fieldcat")
            .join("config.toml")
    }

    /// Write config.toml with the given contents
    pub fn write_config(&self, contents: &str) {
        let path = self.config_path();
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create config dir");
        fs::write(&path, contents).expect("Failed to write config");
    }

    /// Write a file inside the temp home and return its path
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.home.path().join(name);
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Configure the `command` agent to run a shell snippet, no retries
    pub fn use_shell_agent(&self, script: &str) {
        self.write_config(&format!(
            r#"
[analysis]
agent = "command"
max_retries = 0
retry_delay_ms = 0
timeout = 10

[command]
program = ["/bin/sh", "-c", {}]
"#,
            toml_string(script)
        ));
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("fieldcat").expect("fieldcat binary not built");
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn toml_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Parse NDJSON output into records
pub fn records(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("stdout line is not JSON"))
        .collect()
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("non-UTF-8 temp path")
}
