//! Gemini backend implementation.
//!
//! Invokes the Gemini CLI with `--output-format json --approval-mode plan`.
//! The `--approval-mode plan` flag enables read-only mode (no tool execution).

use super::{output_to_result, run_with_stdin, AgentBackend, BackendError, BackendResult};
use crate::analyzer::prompt::Prompt;
use std::process::Command;
use std::time::Duration;

/// Backend for Gemini CLI.
///
/// The JSON output format wraps the model text in a `{"response": ...}`
/// envelope, which the shared parser unwraps.
#[derive(Debug, Clone, Default)]
pub struct GeminiBackend {
    /// Extra CLI arguments to pass to the gemini command.
    extra_args: Vec<String>,
}

impl GeminiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Gemini backend with extra CLI arguments.
    pub fn with_extra_args(extra_args: Vec<String>) -> Self {
        Self { extra_args }
    }

    fn command() -> &'static str {
        "gemini"
    }
}

impl AgentBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn is_available(&self) -> bool {
        super::command_exists(Self::command())
    }

    fn invoke(&self, prompt: &Prompt, timeout: Duration) -> BackendResult<String> {
        if !self.is_available() {
            return Err(BackendError::NotAvailable(
                "gemini CLI not found in PATH".to_string(),
            ));
        }

        let mut cmd = Command::new(Self::command());
        cmd.args(["--output-format", "json"]);

        for arg in &self.extra_args {
            cmd.arg(arg);
        }

        // Approval mode and prompt source must come last
        cmd.args(["--approval-mode", "plan", "--prompt", "-"]);

        let output = run_with_stdin(cmd, &prompt.combined(), timeout)?;
        output_to_result(output)
    }
}
