//! OpenAI-compatible chat completions backend.
//!
//! Sends the system and user prompt as two chat messages to
//! `{base_url}/v1/chat/completions`. The HTTP client is only compiled with
//! the `openai` feature; without it the backend reports itself unavailable.

use super::{AgentBackend, BackendError, BackendResult};
use crate::analyzer::prompt::Prompt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";
pub const DEFAULT_OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Connection settings for the chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiOptions {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for OpenAiOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_key_env: DEFAULT_OPENAI_API_KEY_ENV.to_string(),
        }
    }
}

impl OpenAiOptions {
    /// Endpoint URL, tolerant of a trailing slash on the base URL.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }

    fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

fn chat_request<'a>(options: &'a OpenAiOptions, prompt: &'a Prompt) -> ChatRequest<'a> {
    ChatRequest {
        model: &options.model,
        messages: [
            ChatMessage {
                role: "system",
                content: &prompt.system,
            },
            ChatMessage {
                role: "user",
                content: &prompt.user,
            },
        ],
        temperature: 0.2,
    }
}

/// Pull the assistant text out of a chat completions response body.
fn reply_text(response: ChatResponse) -> BackendResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| BackendError::JsonExtraction {
            response: "chat completion contained no message content".to_string(),
        })
}

/// Backend for the OpenAI chat completions API.
#[derive(Debug, Clone, Default)]
pub struct OpenAiBackend {
    options: OpenAiOptions,
}

impl OpenAiBackend {
    pub fn new(options: OpenAiOptions) -> Self {
        Self { options }
    }

    #[cfg(feature = "openai")]
    fn send(&self, api_key: &str, prompt: &Prompt, timeout: Duration) -> BackendResult<String> {
        use super::RateLimitInfo;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Request(format!("failed to build http client: {e}")))?;

        let url = self.options.endpoint();
        let resp = client
            .post(&url)
            .bearer_auth(api_key)
            .json(&chat_request(&self.options, prompt))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(timeout)
                } else {
                    BackendError::Request(format!("failed to reach {url}: {e}"))
                }
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = resp.text().unwrap_or_default();
            return Err(BackendError::RateLimited(RateLimitInfo {
                retry_after,
                message: text.lines().next().unwrap_or("Too many requests").to_string(),
            }));
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| BackendError::Request(format!("invalid chat completion body: {e}")))?;
        reply_text(parsed)
    }

    #[cfg(not(feature = "openai"))]
    fn send(&self, _api_key: &str, _prompt: &Prompt, _timeout: Duration) -> BackendResult<String> {
        Err(BackendError::NotAvailable(
            "built without the `openai` feature".to_string(),
        ))
    }
}

impl AgentBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "openai") && self.options.api_key().is_some()
    }

    fn invoke(&self, prompt: &Prompt, timeout: Duration) -> BackendResult<String> {
        let Some(api_key) = self.options.api_key() else {
            return Err(BackendError::NotAvailable(format!(
                "{} is not set",
                self.options.api_key_env
            )));
        };
        tracing::debug!(model = %self.options.model, "sending chat completion request");
        self.send(&api_key, prompt, timeout)
    }
}
