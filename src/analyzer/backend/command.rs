//! Generic command backend.
//!
//! Runs any program with the full prompt on stdin and treats its stdout as
//! the reply. Useful for local model runners and wrapper scripts.

use super::{output_to_result, run_with_stdin, AgentBackend, BackendError, BackendResult};
use crate::analyzer::prompt::Prompt;
use std::process::Command;
use std::time::Duration;

/// Backend for an arbitrary program.
///
/// `program[0]` is the executable, the rest are its arguments.
#[derive(Debug, Clone, Default)]
pub struct CommandBackend {
    program: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: Vec<String>) -> Self {
        Self { program }
    }

    fn executable(&self) -> Option<&str> {
        self.program
            .first()
            .map(String::as_str)
            .filter(|p| !p.trim().is_empty())
    }
}

impl AgentBackend for CommandBackend {
    fn name(&self) -> &'static str {
        "Command"
    }

    fn is_available(&self) -> bool {
        match self.executable() {
            // Explicit paths are checked directly, bare names through PATH
            Some(exe) if exe.contains(std::path::MAIN_SEPARATOR) => {
                std::path::Path::new(exe).is_file()
            }
            Some(exe) => super::command_exists(exe),
            None => false,
        }
    }

    fn invoke(&self, prompt: &Prompt, timeout: Duration) -> BackendResult<String> {
        let Some(exe) = self.executable() else {
            return Err(BackendError::NotAvailable(
                "no program configured for the command agent".to_string(),
            ));
        };

        let mut cmd = Command::new(exe);
        cmd.args(&self.program[1..]);

        let output = run_with_stdin(cmd, &prompt.combined(), timeout)?;
        output_to_result(output)
    }
}
