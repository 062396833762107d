//! Generation service boundary and the default chat-completions client.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Produces candidate markup from a system instruction and a task prompt.
pub trait GenerationService: Send + Sync {
    /// Single round trip. `Ok(None)` means the service answered with no
    /// content.
    fn complete(&self, system: &str, task: &str) -> Result<Option<String>>;
}

/// Settings for [`ChatCompletionsClient`].
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Base URL; `/chat/completions` is appended
    pub endpoint: String,
    /// Bearer token. Requests are sent without auth when unset
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            max_tokens: 4000,
            temperature: 0.2,
            timeout_ms: 120_000,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Blocking client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionsClient {
    config: GenerationConfig,
    client: reqwest::blocking::Client,
}

impl ChatCompletionsClient {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

impl GenerationService for ChatCompletionsClient {
    fn complete(&self, system: &str, task: &str) -> Result<Option<String>> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: task,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Requesting completion from {} ({})", self.url(), self.config.model);
        let mut request = self.client.post(self.url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.config.timeout_ms)
            } else {
                Error::GenerationError(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| Error::GenerationError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let msg = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(Error::GenerationError(format!(
                "Service returned {}: {}",
                status.as_u16(),
                msg
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::GenerationError(format!("Malformed response: {}", e)))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| extract_markup(&c))
            .filter(|c| !c.is_empty()))
    }
}

/// Strip a surrounding Markdown code fence (```html ... ```), if any.
pub fn extract_markup(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string (`html`) on the opening fence line.
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}
