//! Codex backend implementation.
//!
//! Invokes the Codex CLI with `exec --sandbox read-only` for read-only analysis.

use super::{parse_rate_limit_info, run_with_stdin, AgentBackend, BackendError, BackendResult};
use crate::analyzer::prompt::Prompt;
use std::process::Command;
use std::time::Duration;

/// Backend for Codex CLI.
///
/// Uses `codex exec --sandbox read-only` for non-interactive analysis.
/// The sandbox flag prevents tool execution.
#[derive(Debug, Clone, Default)]
pub struct CodexBackend {
    /// Extra CLI arguments to pass to the codex command.
    extra_args: Vec<String>,
}

impl CodexBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Codex backend with extra CLI arguments.
    pub fn with_extra_args(extra_args: Vec<String>) -> Self {
        Self { extra_args }
    }

    fn command() -> &'static str {
        "codex"
    }
}

impl AgentBackend for CodexBackend {
    fn name(&self) -> &'static str {
        "Codex"
    }

    fn is_available(&self) -> bool {
        super::command_exists(Self::command())
    }

    fn invoke(&self, prompt: &Prompt, timeout: Duration) -> BackendResult<String> {
        if !self.is_available() {
            return Err(BackendError::NotAvailable(
                "codex CLI not found in PATH".to_string(),
            ));
        }

        // Run in the temp dir so no project context is loaded.
        // When stdout is piped, codex writes the answer to stdout and
        // status output to stderr.
        let workdir = std::env::temp_dir();
        let mut cmd = Command::new(Self::command());
        cmd.arg("exec").arg("--cd").arg(&workdir);
        cmd.arg("--skip-git-repo-check");

        for arg in &self.extra_args {
            cmd.arg(arg);
        }

        // Sandbox must come last so extra_args cannot override it
        cmd.args(["--sandbox", "read-only"]);

        let output = run_with_stdin(cmd, &prompt.combined(), timeout)?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if output.status.success() || !stdout.trim().is_empty() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if let Some(info) = parse_rate_limit_info(&stderr) {
            return Err(BackendError::RateLimited(info));
        }

        Err(BackendError::ExitCode {
            code: output.status.code().unwrap_or(-1),
            stderr,
        })
    }
}
