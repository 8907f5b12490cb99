//! Analysis configuration types for the `analyze` command.
//!
//! These are pure data containers (serde structs + validation). CLI flags
//! take priority over config, which overrides defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Agent names accepted in `[analysis].agent`.
pub const KNOWN_AGENTS: [&str; 5] = ["claude", "codex", "gemini", "command", "openai"];

/// `[analysis]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Agent used for analysis
    #[serde(default = "default_analysis_agent")]
    pub agent: String,
    /// Fields per collaborator call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Retries after the first attempt of a batch
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Base delay between attempts, doubled on each retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Timeout per call in seconds
    #[serde(default = "default_analysis_timeout")]
    pub timeout: u64,
    /// Language of generated names and descriptions
    #[serde(default = "default_language")]
    pub language: String,
    /// Context sentence prefixed to every batch
    #[serde(default = "default_context")]
    pub context: String,
}

pub fn default_analysis_agent() -> String {
    "claude".to_string()
}

pub fn default_batch_size() -> usize {
    40
}

pub fn default_max_retries() -> usize {
    2
}

pub fn default_retry_delay_ms() -> u64 {
    1000
}

pub fn default_analysis_timeout() -> u64 {
    120
}

pub fn default_language() -> String {
    "English".to_string()
}

pub fn default_context() -> String {
    "Financial data API response".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            agent: default_analysis_agent(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout: default_analysis_timeout(),
            language: default_language(),
            context: default_context(),
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration values.
    ///
    /// Returns `Ok(())` if all values are within acceptable bounds,
    /// or an error describing the first invalid value found.
    pub fn validate(&self) -> Result<(), String> {
        let agent = self.agent.to_lowercase();
        if !KNOWN_AGENTS.contains(&agent.as_str()) {
            return Err(format!(
                "Unknown agent '{}'. Valid: {}",
                self.agent,
                KNOWN_AGENTS.join(", ")
            ));
        }
        if self.batch_size == 0 {
            return Err("analysis.batch_size must be > 0".to_string());
        }
        if self.batch_size > 500 {
            return Err(format!(
                "analysis.batch_size {} exceeds maximum (500)",
                self.batch_size
            ));
        }
        if self.max_retries > 10 {
            return Err(format!(
                "analysis.max_retries {} exceeds maximum (10)",
                self.max_retries
            ));
        }
        if self.timeout == 0 {
            return Err("analysis.timeout must be > 0".to_string());
        }
        if self.timeout > 3600 {
            return Err(format!(
                "analysis.timeout {} exceeds maximum (3600s)",
                self.timeout
            ));
        }
        Ok(())
    }
}

/// Per-agent CLI settings.
///
/// ```toml
/// [agents.codex]
/// extra_args = ["--model", "gpt-5.2-codex"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    /// Extra CLI arguments inserted before the agent's safety flags
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Look up extra arguments for an agent.
pub fn agent_extra_args<'a>(agents: &'a HashMap<String, AgentConfig>, name: &str) -> &'a [String] {
    agents
        .get(name)
        .map(|c| c.extra_args.as_slice())
        .unwrap_or(&[])
}
