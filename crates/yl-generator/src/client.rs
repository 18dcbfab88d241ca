//! Generation client: one timed call to the external text generator.
//!
//! [`GenerationClient`] is the seam the orchestrator drives. [`GeminiClient`]
//! implements it against the Gemini `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;

/// Transient generator-side failure. All variants are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Connection, timeout, or undecodable body.
    #[error("transport_error: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("service_error: status {status}: {body}")]
    Service { status: u16, body: String },

    /// Zero candidates or zero parts.
    #[error("empty_response")]
    EmptyResponse,
}

impl GenerationError {
    /// Stable reason code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Transport(_) => "transport_error",
            GenerationError::Service { .. } => "service_error",
            GenerationError::EmptyResponse => "empty_response",
        }
    }
}

/// Anything that turns a prompt into raw text.
///
/// Implementations must support concurrent independent calls.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Make exactly one generation call.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[async_trait]
impl<C: GenerationClient + ?Sized> GenerationClient for std::sync::Arc<C> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt).await
    }
}

/// Gemini client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Model name, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// Base endpoint URL.
    pub endpoint: String,
    pub temperature: f32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Per-call timeout.
    pub timeout: Duration,
}

/// Model used when `GEMINI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.9,
            top_p: 0.9,
            max_output_tokens: 4096,
            timeout: Duration::from_secs(45),
        }
    }
}

impl GeminiConfig {
    /// Build from a variable lookup (`GEMINI_API_KEY` required, `GEMINI_MODEL` optional).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_blank("GEMINI_API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let model = non_blank("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            model,
            ..Default::default()
        })
    }

    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client; the per-call timeout is fixed here.
    pub fn new(config: GeminiConfig) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(GeminiConfig::from_env()?)
    }

    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: String,
}

/// First part of the first candidate, trimmed.
fn extract_text(body: &str) -> Result<String, GenerationError> {
    let parsed: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Transport(format!("undecodable response body: {}", e)))?;

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text.trim().to_string())
        .ok_or(GenerationError::EmptyResponse)
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.config.api_key)
                .map_err(|e| GenerationError::Transport(format!("invalid api key header: {}", e)))?,
        );

        let response = self
            .client
            .post(self.build_url())
            .headers(headers)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        debug!(model = %self.config.model, body_len = body.len(), "generator responded");
        extract_text(&body)
    }
}
