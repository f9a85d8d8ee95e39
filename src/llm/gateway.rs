//! Core `ModelGateway` trait and `ApiGateway` implementation.
//!
//! `ApiGateway` calls an Anthropic-style `/v1/messages` endpoint.  All
//! connection details come from [`LlmConfig`]; nothing is hardcoded.  One
//! request per batch — no retry, no backoff, no streaming.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Errors that can occur during a model call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("model request timed out")]
    Timeout,

    /// The service answered with a non-success status (auth fault, quota
    /// fault, bad request).  The body is kept for diagnosis.
    #[error("model service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as the expected envelope.
    #[error("failed to parse model response envelope: {0}")]
    Parse(String),

    /// The model returned a response with no usable text content.
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ModelGateway trait
// ---------------------------------------------------------------------------

/// Async interface to the remote model service.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn ModelGateway>`.  Errors are propagated, never swallowed — the
/// pipeline driver decides what a gateway failure means for the run.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Send one prompt with the given system instruction and return the raw
    /// reply text.
    async fn send(&self, system: &str, prompt: &str) -> Result<String, GatewayError>;
}

// Compile-time assertion: Box<dyn ModelGateway> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn ModelGateway>) {}
};

// ---------------------------------------------------------------------------
// ApiGateway
// ---------------------------------------------------------------------------

/// Wire-format version header required by the messages endpoint.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Production gateway that posts to `{base_url}/v1/messages`.
///
/// The HTTP client is pre-configured with the per-request timeout from
/// `config.timeout_secs`, so a hung request surfaces as
/// [`GatewayError::Timeout`] instead of stalling the run indefinitely.
pub struct ApiGateway {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

impl ApiGateway {
    /// Build an `ApiGateway` from model config plus the already-loaded key.
    ///
    /// A default (no-timeout) client is used as a last-resort fallback if the
    /// builder fails (should never happen in practice).
    pub fn new(config: &LlmConfig, api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            api_key,
        }
    }
}

#[async_trait]
impl ModelGateway for ApiGateway {
    async fn send(&self, system: &str, prompt: &str) -> Result<String, GatewayError> {
        let url = format!("{}/v1/messages", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "max_tokens":  self.config.max_tokens,
            "temperature": self.config.temperature,
            "system":      system,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        let text = json["content"][0]["text"]
            .as_str()
            .ok_or(GatewayError::EmptyResponse)?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }

        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
