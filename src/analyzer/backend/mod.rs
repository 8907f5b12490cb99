//! Agent backend implementations for field analysis.
//!
//! This module provides the Strategy pattern for different inference
//! collaborators. Each backend knows how to deliver a prompt and return the
//! raw reply; response parsing is shared.
//!
//! # Supported Agents
//!
//! - **Claude**: `claude --print --output-format json --tools "" -p -`
//! - **Codex**: `codex exec --sandbox read-only`
//! - **Gemini**: `gemini --output-format json --approval-mode plan --prompt -`
//! - **Command**: any program reading the prompt on stdin
//! - **OpenAI**: chat completions over HTTP (`openai` feature)
//!
//! # Design
//!
//! The `AgentBackend` trait defines the interface for all backends.
//! Backends are stateless and can be shared with a worker thread.

mod claude;
mod codex;
mod command;
mod gemini;
mod openai;

pub use claude::ClaudeBackend;
pub use codex::CodexBackend;
pub use command::CommandBackend;
pub use gemini::GeminiBackend;
pub use openai::{OpenAiBackend, OpenAiOptions};

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::analyzer::parse::{parse_field_metadata, RawFieldMetadata};
use crate::analyzer::prompt::Prompt;

/// Wait for child process with timeout.
///
/// Uses a simple polling approach since std::process doesn't have
/// native timeout support. Includes proper process reaping to prevent zombies.
pub(crate) fn wait_with_timeout(
    child: &mut std::process::Child,
    timeout: Duration,
) -> std::io::Result<std::process::Output> {
    use std::io::Read;
    use std::thread;
    use std::time::Instant;

    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = child
                    .stdout
                    .take()
                    .map(|mut s| {
                        let mut buf = Vec::new();
                        s.read_to_end(&mut buf).ok();
                        buf
                    })
                    .unwrap_or_default();

                let stderr = child
                    .stderr
                    .take()
                    .map(|mut s| {
                        let mut buf = Vec::new();
                        s.read_to_end(&mut buf).ok();
                        buf
                    })
                    .unwrap_or_default();

                return Ok(std::process::Output {
                    status,
                    stdout,
                    stderr,
                });
            }
            Ok(None) => {
                if start.elapsed() >= timeout {
                    // Kill and reap to prevent zombie process
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "Process timed out",
                    ));
                }
                thread::sleep(poll_interval);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Spawn a CLI agent, feed it the prompt on stdin and collect its output.
///
/// Stdin is fed and stdout/stderr are drained on background threads, so
/// neither a large prompt nor a chatty agent can block past the timeout.
pub(crate) fn run_with_stdin(
    mut cmd: std::process::Command,
    input: &str,
    timeout: Duration,
) -> BackendResult<std::process::Output> {
    use std::io::{Read, Write};
    use std::process::Stdio;

    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn()?;

    let stdout_reader = child.stdout.take().map(|mut out| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            out.read_to_end(&mut buf).ok();
            buf
        })
    });
    let stderr_reader = child.stderr.take().map(|mut err| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            err.read_to_end(&mut buf).ok();
            buf
        })
    });

    if let Some(mut stdin) = child.stdin.take() {
        let input = input.to_owned();
        // Not joined: a killed agent closes the pipe and the write returns.
        std::thread::spawn(move || {
            // A program that exits without reading its input closes the pipe
            // early; that is reported through its exit status instead.
            if let Err(e) = stdin.write_all(input.as_bytes()) {
                tracing::debug!(error = %e, "agent closed stdin early");
            }
        });
    }

    match wait_with_timeout(&mut child, timeout) {
        Ok(mut output) => {
            if let Some(handle) = stdout_reader {
                output.stdout = handle.join().unwrap_or_default();
            }
            if let Some(handle) = stderr_reader {
                output.stderr = handle.join().unwrap_or_default();
            }
            Ok(output)
        }
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(BackendError::Timeout(timeout)),
        Err(e) => Err(BackendError::Io(e)),
    }
}

/// Result type for agent backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Trait for inference backends (Strategy pattern).
///
/// Implementors must be thread-safe as the orchestrator runs on a worker
/// thread while the caller drains events.
pub trait AgentBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Check if the agent is usable on this system.
    fn is_available(&self) -> bool;

    /// Invoke the agent with a prompt and return the raw response.
    ///
    /// # Arguments
    ///
    /// * `prompt` - System instructions and the batch request
    /// * `timeout` - Maximum time to wait for a response
    fn invoke(&self, prompt: &Prompt, timeout: Duration) -> BackendResult<String>;

    /// Parse a raw response into per-field metadata records.
    fn parse_response(&self, response: &str) -> BackendResult<Vec<RawFieldMetadata>> {
        parse_field_metadata(response)
    }
}

/// Agent types supported for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentType {
    Claude,
    Codex,
    Gemini,
    Command,
    OpenAi,
}

/// Per-run settings needed to construct a backend.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Extra CLI arguments for the Claude, Codex and Gemini CLIs.
    pub extra_args: Vec<String>,
    /// Program and arguments for the command backend.
    pub program: Vec<String>,
    pub openai: OpenAiOptions,
}

impl AgentType {
    /// All agent types, in the order they are listed to users.
    pub const ALL: [AgentType; 5] = [
        AgentType::Claude,
        AgentType::Codex,
        AgentType::Gemini,
        AgentType::Command,
        AgentType::OpenAi,
    ];

    /// Create the backend for this agent type with default settings.
    pub fn create_backend(&self) -> Box<dyn AgentBackend> {
        self.create_backend_with(&BackendOptions::default())
    }

    /// Create the backend for this agent type.
    pub fn create_backend_with(&self, options: &BackendOptions) -> Box<dyn AgentBackend> {
        match self {
            AgentType::Claude => Box::new(ClaudeBackend::with_extra_args(
                options.extra_args.clone(),
            )),
            AgentType::Codex => Box::new(CodexBackend::with_extra_args(options.extra_args.clone())),
            AgentType::Gemini => Box::new(GeminiBackend::with_extra_args(
                options.extra_args.clone(),
            )),
            AgentType::Command => Box::new(CommandBackend::new(options.program.clone())),
            AgentType::OpenAi => Box::new(OpenAiBackend::new(options.openai.clone())),
        }
    }

    /// Config/CLI name for this agent.
    pub fn command_name(&self) -> &'static str {
        match self {
            AgentType::Claude => "claude",
            AgentType::Codex => "codex",
            AgentType::Gemini => "gemini",
            AgentType::Command => "command",
            AgentType::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentType::Claude => write!(f, "Claude"),
            AgentType::Codex => write!(f, "Codex"),
            AgentType::Gemini => write!(f, "Gemini"),
            AgentType::Command => write!(f, "Command"),
            AgentType::OpenAi => write!(f, "OpenAI"),
        }
    }
}

/// Error for agent names that match no [`AgentType`].
#[derive(Debug, Clone, Error)]
#[error("Unknown agent: '{0}'. Supported agents: claude, codex, gemini, command, openai")]
pub struct UnknownAgent(pub String);

impl FromStr for AgentType {
    type Err = UnknownAgent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(AgentType::Claude),
            "codex" => Ok(AgentType::Codex),
            "gemini" | "gemini-cli" => Ok(AgentType::Gemini),
            "command" | "cmd" => Ok(AgentType::Command),
            "openai" => Ok(AgentType::OpenAi),
            _ => Err(UnknownAgent(s.to_string())),
        }
    }
}

/// Errors from agent backends.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Agent not available: {0}")]
    NotAvailable(String),

    #[error("Agent timed out after {0:?}")]
    Timeout(Duration),

    #[error("Exit code {code}: {}", truncate_stderr(stderr))]
    ExitCode { code: i32, stderr: String },

    #[error("HTTP {status}: {}", truncate_stderr(body))]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Rate limited: {0}")]
    RateLimited(RateLimitInfo),

    #[error("Failed to parse response as JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to extract JSON from response")]
    JsonExtraction { response: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rate limit information extracted from agent response.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// When the rate limit resets (if provided by agent)
    pub retry_after: Option<Duration>,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for RateLimitInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(retry_after) = self.retry_after {
            write!(f, "{} (retry after {:?})", self.message, retry_after)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl BackendError {
    /// Agent-provided delay before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BackendError::RateLimited(info) => info.retry_after,
            _ => None,
        }
    }

    /// Extract wait duration for retry logic.
    ///
    /// Uses agent-provided retry_after if available, otherwise falls back
    /// to the provided default duration.
    pub fn wait_duration(&self, fallback: Duration) -> Duration {
        self.retry_after().unwrap_or(fallback)
    }
}

/// Turn a finished CLI process into a reply or a backend error.
///
/// A non-zero exit with rate-limit wording on stderr becomes
/// [`BackendError::RateLimited`].
pub(crate) fn output_to_result(output: std::process::Output) -> BackendResult<String> {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();

    if output.status.success() {
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

/// Parse rate limit info from agent CLI stderr.
///
/// Each agent signals rate limiting differently. This function
/// attempts to extract retry-after timing from various formats.
pub fn parse_rate_limit_info(stderr: &str) -> Option<RateLimitInfo> {
    let stderr_lower = stderr.to_lowercase();

    let is_rate_limited = stderr_lower.contains("rate limit")
        || stderr_lower.contains("throttled")
        || stderr_lower.contains("resource_exhausted")
        || stderr_lower.contains("429")
        || stderr_lower.contains("too many requests")
        || stderr_lower.contains("quota exceeded");

    if !is_rate_limited {
        return None;
    }

    let retry_after = extract_retry_seconds(&stderr_lower).map(Duration::from_secs);

    Some(RateLimitInfo {
        retry_after,
        message: stderr.lines().next().unwrap_or("Rate limited").to_string(),
    })
}

/// Extract retry delay from various formats without a regex dependency.
fn extract_retry_seconds(stderr: &str) -> Option<u64> {
    let extract_after = |text: &str, keyword: &str| -> Option<u64> {
        text.find(keyword).and_then(|pos| {
            let after = &text[pos + keyword.len()..];
            extract_first_number(after)
        })
    };

    // "retry after 45 seconds", "retry_after: 45", "retry in 30s",
    // "retrydelay: 60" (Gemini), "wait 30 seconds"
    for keyword in ["retry after ", "retry_after", "retry in ", "retrydelay:", "wait "] {
        if let Some(secs) = extract_after(stderr, keyword) {
            return Some(secs);
        }
    }

    // "45 seconds remaining"
    if stderr.contains("seconds") {
        return extract_first_number(stderr);
    }

    None
}

/// Extract the first number from a string.
fn extract_first_number(s: &str) -> Option<u64> {
    let mut num_str = String::new();
    let mut found_digit = false;

    for c in s.chars() {
        if c.is_ascii_digit() {
            num_str.push(c);
            found_digit = true;
        } else if found_digit {
            break;
        }
    }

    num_str.parse().ok()
}

/// Truncate stderr for error display.
///
/// Takes the first line and limits to 200 characters for readability.
fn truncate_stderr(stderr: &str) -> String {
    let first_line = stderr.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= 200 {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(200).collect();
        format!("{}...", cut)
    }
}

/// Check if a command is available in PATH.
///
/// Uses platform-specific command lookup:
/// - Unix: `which` command
/// - Windows: `where` command
pub fn command_exists(command: &str) -> bool {
    #[cfg(windows)]
    let lookup_cmd = "where";
    #[cfg(not(windows))]
    let lookup_cmd = "which";

    std::process::Command::new(lookup_cmd)
        .arg(command)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
