//! Claude backend implementation.
//!
//! Invokes the Claude CLI with `--print --output-format json --tools ""`
//! and reads the prompt from stdin.

use super::{parse_rate_limit_info, run_with_stdin, AgentBackend, BackendError, BackendResult};
use crate::analyzer::prompt::Prompt;
use serde::Deserialize;
use std::process::Command;
use std::time::Duration;

/// Backend for Claude CLI.
///
/// Uses `claude --print --output-format json --tools ""`
/// for non-interactive analysis.
#[derive(Debug, Clone, Default)]
pub struct ClaudeBackend {
    /// Extra CLI arguments to pass before the stdin passthrough args.
    extra_args: Vec<String>,
}

impl ClaudeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Claude backend with extra CLI arguments.
    pub fn with_extra_args(extra_args: Vec<String>) -> Self {
        Self { extra_args }
    }

    fn command() -> &'static str {
        "claude"
    }
}

impl AgentBackend for ClaudeBackend {
    fn name(&self) -> &'static str {
        "Claude"
    }

    fn is_available(&self) -> bool {
        super::command_exists(Self::command())
    }

    fn invoke(&self, prompt: &Prompt, timeout: Duration) -> BackendResult<String> {
        if !self.is_available() {
            return Err(BackendError::NotAvailable(
                "claude CLI not found in PATH".to_string(),
            ));
        }

        let mut cmd = Command::new(Self::command());
        cmd.args(["--print", "--output-format", "json"]);
        cmd.args(["--system-prompt", &prompt.system]);

        // Extra args go BEFORE the stdin passthrough
        for arg in &self.extra_args {
            cmd.arg(arg);
        }

        // "-p -" reads the prompt from stdin (avoids ARG_MAX limits)
        cmd.args(["--tools", "", "-p", "-"]);

        let output = run_with_stdin(cmd, &prompt.user, timeout)?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if let Some(info) = parse_rate_limit_info(&stderr) {
            return Err(BackendError::RateLimited(info));
        }

        // Claude CLI may exit 1 but put the error into the JSON envelope on stdout
        let error_msg = extract_error_from_claude_response(&stdout).unwrap_or(stderr);
        Err(BackendError::ExitCode {
            code: output.status.code().unwrap_or(-1),
            stderr: error_msg,
        })
    }
}

/// Claude CLI wrapper format for error extraction.
#[derive(Debug, Deserialize)]
struct ClaudeErrorWrapper {
    is_error: Option<bool>,
    result: Option<String>,
}

/// Extract error message from Claude's JSON response wrapper.
fn extract_error_from_claude_response(stdout: &str) -> Option<String> {
    let wrapper: ClaudeErrorWrapper = serde_json::from_str(stdout.trim()).ok()?;

    if wrapper.is_error == Some(true) {
        wrapper
            .result
            .or_else(|| Some("Claude returned an error".to_string()))
    } else {
        wrapper.result.filter(|r| !r.is_empty())
    }
}
