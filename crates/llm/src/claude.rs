//! Claude-backed `gweta_core::Llm` adapter.
//!
//! Kept from the donor workspace's `ClaudeBackend` as the one concrete LLM
//! integration (the provider's network behavior is otherwise out of scope);
//! trimmed of native tool-use, since the query core has no tool-calling
//! surface, and adapted to the single-prompt `complete`/`stream` interface.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use gweta_core::{Error, Llm, LlmStreamToken};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaudeModel {
    Opus4_5,
    Sonnet4,
    Haiku3_5,
}

impl ClaudeModel {
    pub fn model_id(&self) -> &'static str {
        match self {
            ClaudeModel::Opus4_5 => "claude-opus-4-5-20251101",
            ClaudeModel::Sonnet4 => "claude-sonnet-4-20250514",
            ClaudeModel::Haiku3_5 => "claude-3-5-haiku-20241022",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "opus" | "opus-4.5" => Some(ClaudeModel::Opus4_5),
            "sonnet" | "sonnet-4" => Some(ClaudeModel::Sonnet4),
            "haiku" | "haiku-3.5" => Some(ClaudeModel::Haiku3_5),
            _ => None,
        }
    }
}

impl Default for ClaudeModel {
    fn default() -> Self {
        ClaudeModel::Sonnet4
    }
}

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: ClaudeModel,
    pub timeout: Duration,
    pub endpoint: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: ClaudeModel::default(),
            timeout: Duration::from_secs(60),
            endpoint: "https://api.anthropic.com".to_string(),
        }
    }
}

impl ClaudeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Default::default() }
    }

    pub fn with_model(mut self, model: ClaudeModel) -> Self {
        self.model = model;
        self
    }
}

pub struct ClaudeLlm {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeLlm {
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "ANTHROPIC_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn request(&self, prompt: &str, max_tokens: usize, temperature: f32, stream: bool) -> ClaudeRequest {
        ClaudeRequest {
            model: self.config.model.model_id().to_string(),
            max_tokens,
            messages: vec![ClaudeMessage { role: "user".to_string(), content: prompt.to_string() }],
            temperature: Some(temperature.clamp(0.0, 1.0)),
            stream: Some(stream),
        }
    }
}

#[async_trait]
impl Llm for ClaudeLlm {
    #[tracing::instrument(skip(self, prompt))]
    async fn complete(&self, prompt: &str, max_tokens: usize, temperature: f32) -> Result<String, Error> {
        let request = self.request(prompt, max_tokens, temperature, false);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)).into());
        }

        let parsed: ClaudeApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = parsed.content.into_iter().map(|b| b.text).collect::<String>();
        Ok(text)
    }

    #[tracing::instrument(skip(self, prompt, tx))]
    async fn stream(
        &self,
        prompt: &str,
        max_tokens: usize,
        temperature: f32,
        tx: mpsc::Sender<LlmStreamToken>,
    ) -> Result<String, Error> {
        let request = self.request(prompt, max_tokens, temperature, true);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)).into());
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut full_text = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LlmError::Network(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim().to_string();
                buffer.replace_range(..=line_end, "");

                let Some(json_str) = line.strip_prefix("data: ") else { continue };
                if json_str == "[DONE]" {
                    continue;
                }
                let Ok(event) = serde_json::from_str::<ClaudeStreamEvent>(json_str) else { continue };

                match event {
                    ClaudeStreamEvent::ContentBlockDelta { delta: ClaudeDelta::TextDelta { text } } => {
                        full_text.push_str(&text);
                        let _ = tx
                            .send(LlmStreamToken { text, is_final: false })
                            .await;
                    }
                    ClaudeStreamEvent::MessageStop => {
                        let _ = tx
                            .send(LlmStreamToken { text: String::new(), is_final: true })
                            .await;
                    }
                    _ => {}
                }
            }
        }

        Ok(full_text)
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    content: Vec<ClaudeContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeStreamEvent {
    ContentBlockDelta { delta: ClaudeDelta },
    MessageStop,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}
