//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::analysis::{AgentConfig, AnalysisConfig};
use crate::chunking::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_SKIP_FIELDS};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Per-agent CLI settings keyed by agent name
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,
    #[serde(default)]
    pub command: CommandConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[command]`: program run by the `command` agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommandConfig {
    /// Executable followed by its arguments
    #[serde(default)]
    pub program: Vec<String>,
}

/// `[openai]`: chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

pub fn default_openai_model() -> String {
    "gpt-4.1".to_string()
}

pub fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_openai_api_key_env(),
        }
    }
}

/// `[chunking]`: structural views (`chunk`, `schema`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Byte ceiling per chunk
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// Key fragments dropped from structural views
    #[serde(default = "default_skip_fields")]
    pub skip_fields: Vec<String>,
}

pub fn default_max_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

pub fn default_skip_fields() -> Vec<String> {
    DEFAULT_SKIP_FIELDS.iter().map(|s| s.to_string()).collect()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            skip_fields: default_skip_fields(),
        }
    }
}

/// `[output]`: event stream framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// "ndjson" or "sse"
    #[serde(default = "default_output_format")]
    pub format: String,
}

pub fn default_output_format() -> String {
    "ndjson".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
        }
    }
}

impl Config {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        self.analysis.validate()?;

        if self.analysis.agent.eq_ignore_ascii_case("command")
            && self.command.program.iter().all(|p| p.trim().is_empty())
        {
            return Err(
                "command.program must name an executable when analysis.agent is \"command\""
                    .to_string(),
            );
        }
        if self.chunking.max_chunk_size < 64 {
            return Err(format!(
                "chunking.max_chunk_size {} is below minimum (64)",
                self.chunking.max_chunk_size
            ));
        }
        let format = self.output.format.to_lowercase();
        if !["ndjson", "jsonl", "sse"].contains(&format.as_str()) {
            return Err(format!(
                "Unknown output.format '{}'. Valid: ndjson, sse",
                self.output.format
            ));
        }
        Ok(())
    }
}
