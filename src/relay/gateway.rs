//! Model gateway: single-shot HTTP calls to the upstream language model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{AiConfig, ProviderKind};

use super::RelayError;

/// Content used when the provider envelope carries no text.
pub const EMPTY_REPLY: &str = "No response generated.";

/// Upstream error bodies that signal an exhausted quota.
const QUOTA_SIGNALS: [&str; 3] = ["RESOURCE_EXHAUSTED", "insufficient_quota", "quota exceeded"];

/// Raw reply extracted from the provider envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    /// Primary text field.
    pub text: String,
    /// Provider finish reason, if reported.
    pub finish_reason: Option<String>,
}

/// Trait for upstream model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send one prompt upstream. No retries.
    async fn generate(&self, prompt: &str) -> Result<GatewayReply, RelayError>;

    /// Model identifier recorded in the audit trail.
    fn model(&self) -> &str;
}

/// Build an HTTP client with the configured timeouts.
fn build_http_client(config: &AiConfig) -> Result<Client, RelayError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| RelayError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Read the provider credential from the configured environment variable.
///
/// # Errors
///
/// Returns `RelayError::Configuration` if the variable is unset or empty.
pub fn api_key_from_env(config: &AiConfig) -> Result<String, RelayError> {
    std::env::var(&config.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            RelayError::Configuration(format!("{} is not configured", config.api_key_env))
        })
}

/// Map a non-2xx upstream status and body to a relay error.
#[must_use]
pub fn classify_failure(status: u16, body: &str) -> RelayError {
    let detail = format!("HTTP {status}: {body}");
    match status {
        429 => RelayError::RateLimited(detail),
        402 => RelayError::QuotaExhausted(detail),
        _ if QUOTA_SIGNALS.iter().any(|signal| body.contains(signal)) => {
            RelayError::QuotaExhausted(detail)
        }
        _ => RelayError::Upstream(detail),
    }
}

fn transport_error(e: &reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::Upstream("upstream request timed out".to_string())
    } else {
        RelayError::Upstream(e.to_string())
    }
}

/// POST a JSON body and return the parsed JSON reply, classifying failures.
async fn post_json(
    request: reqwest::RequestBuilder,
    body: &serde_json::Value,
) -> Result<serde_json::Value, RelayError> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| transport_error(&e))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let err = classify_failure(status.as_u16(), &text);
        tracing::error!(status = status.as_u16(), kind = err.kind().as_str(), "Model API error");
        return Err(err);
    }

    response
        .json()
        .await
        .map_err(|e| RelayError::Upstream(format!("invalid upstream JSON: {e}")))
}

/// Gemini `generateContent` provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, RelayError> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<GatewayReply, RelayError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "maxOutputTokens": self.max_tokens
            }
        });

        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key);
        let json = post_json(request, &body).await?;

        let candidate = &json["candidates"][0];
        Ok(GatewayReply {
            text: candidate["content"]["parts"][0]["text"]
                .as_str()
                .filter(|t| !t.is_empty())
                .unwrap_or(EMPTY_REPLY)
                .to_string(),
            finish_reason: candidate["finishReason"].as_str().map(String::from),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// OpenAI-compatible chat-completions provider, used behind AI gateways.
#[derive(Debug, Clone)]
pub struct ChatCompletionsProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ChatCompletionsProvider {
    /// Create a new chat-completions provider.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, RelayError> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ModelProvider for ChatCompletionsProvider {
    async fn generate(&self, prompt: &str) -> Result<GatewayReply, RelayError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        });

        let request = self.client.post(&url).bearer_auth(&self.api_key);
        let json = post_json(request, &body).await?;

        let choice = &json["choices"][0];
        Ok(GatewayReply {
            text: choice["message"]["content"]
                .as_str()
                .filter(|t| !t.is_empty())
                .unwrap_or(EMPTY_REPLY)
                .to_string(),
            finish_reason: choice["finish_reason"].as_str().map(String::from),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Provider enum for dispatch.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(GeminiProvider),
    ChatCompletions(ChatCompletionsProvider),
}

impl Provider {
    /// Create the configured provider with an explicit credential.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, RelayError> {
        Ok(match config.provider {
            ProviderKind::Gemini => Self::Gemini(GeminiProvider::new(config, api_key)?),
            ProviderKind::OpenAi => {
                Self::ChatCompletions(ChatCompletionsProvider::new(config, api_key)?)
            }
        })
    }

    /// Create the configured provider, reading the credential from the
    /// environment once.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Configuration` if the API key variable is not set.
    pub fn from_config(config: &AiConfig) -> Result<Self, RelayError> {
        let api_key = api_key_from_env(config)?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl ModelProvider for Provider {
    async fn generate(&self, prompt: &str) -> Result<GatewayReply, RelayError> {
        match self {
            Self::Gemini(p) => p.generate(prompt).await,
            Self::ChatCompletions(p) => p.generate(prompt).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            Self::Gemini(p) => p.model(),
            Self::ChatCompletions(p) => p.model(),
        }
    }
}
