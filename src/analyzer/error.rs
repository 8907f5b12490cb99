//! User-friendly error handling for analysis operations.
//!
//! This module provides:
//! - `AnalysisError` - pipeline-level failures, surfaced as an `error` event
//! - `AttemptFailure` - why a single collaborator attempt was unusable
//!
//! Attempt failures never reach the caller directly: they drive retries and,
//! once retries run out, the templated fallback.

use crate::analyzer::backend::{AgentType, BackendError};
use crate::analyzer::events::SinkClosed;
use std::fmt;
use std::time::Duration;

/// Error type for a whole analysis run.
///
/// All variants include messages suitable for the `error` event and CLI
/// output.
#[derive(Debug)]
pub enum AnalysisError {
    /// The request carried no document.
    NoDocument,

    /// The input could not be parsed as JSON.
    InvalidJson {
        /// Parser message
        message: String,
    },

    /// Agent is not usable on this system.
    AgentNotAvailable {
        /// The agent type that was requested
        agent: AgentType,
    },

    /// A batch request could not be built.
    RequestBuild {
        /// Section of the failing batch
        section: String,
        message: String,
    },

    /// The run was interrupted.
    Cancelled,

    /// The observer stopped listening.
    ChannelClosed,

    /// The analysis worker ended without a terminal event.
    WorkerPanicked,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::NoDocument => write!(f, "No JSON data provided"),
            AnalysisError::InvalidJson { message } => {
                write!(f, "Invalid JSON input: {}", message)
            }
            AnalysisError::AgentNotAvailable { agent } => match agent {
                AgentType::Command => write!(
                    f,
                    "Agent 'Command' is not available. Set [command] program in the config to an executable."
                ),
                AgentType::OpenAi => write!(
                    f,
                    "Agent 'OpenAI' is not available. Build with the `openai` feature and set the API key environment variable."
                ),
                _ => write!(
                    f,
                    "Agent '{}' is not available. Please install the {} CLI and ensure it's in your PATH.",
                    agent,
                    agent.command_name()
                ),
            },
            AnalysisError::RequestBuild { section, message } => {
                write!(
                    f,
                    "Failed to build request for section \"{}\": {}",
                    section, message
                )
            }
            AnalysisError::Cancelled => write!(f, "Analysis cancelled"),
            AnalysisError::ChannelClosed => write!(f, "Event channel closed by the observer"),
            AnalysisError::WorkerPanicked => write!(f, "Analysis failed"),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<SinkClosed> for AnalysisError {
    fn from(_: SinkClosed) -> Self {
        AnalysisError::ChannelClosed
    }
}

/// Why one collaborator attempt produced nothing usable.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    /// Transport, process or service failure.
    Backend {
        message: String,
        /// Agent-provided delay before the next attempt
        retry_after: Option<Duration>,
    },

    /// No JSON array could be recovered from the reply.
    Unparseable {
        /// Truncated reply for debugging
        response_preview: String,
    },

    /// The reply was an empty array.
    Empty,

    /// The reply did not describe every field of the batch.
    Misaligned { expected: usize, got: usize },
}

impl AttemptFailure {
    /// Classify a backend error.
    pub fn from_backend_error(error: &BackendError) -> Self {
        match error {
            BackendError::JsonExtraction { response } => AttemptFailure::Unparseable {
                response_preview: truncate_response(response, 200),
            },
            BackendError::JsonParse(e) => AttemptFailure::Unparseable {
                response_preview: e.to_string(),
            },
            other => AttemptFailure::Backend {
                message: other.to_string(),
                retry_after: other.retry_after(),
            },
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AttemptFailure::Backend { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Backend { message, .. } => write!(f, "{}", message),
            AttemptFailure::Unparseable { response_preview } => {
                write!(f, "Unparseable response: {}", response_preview)
            }
            AttemptFailure::Empty => write!(f, "Empty response"),
            AttemptFailure::Misaligned { expected, got } => {
                write!(f, "Expected {} fields, got {}", expected, got)
            }
        }
    }
}

/// Truncate a response string for display.
pub(crate) fn truncate_response(response: &str, max_len: usize) -> String {
    let trimmed = response.trim();
    match trimmed.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
