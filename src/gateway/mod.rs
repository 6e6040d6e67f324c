//! Upstream gateway: the HTTP collaborator that forwards prompts to the
//! generative-language provider.
//!
//! This module provides:
//! * [`Gateway`] — async trait implemented by every transport.
//! * [`ProxyGateway`] — `POST /api/gemini` with `{prompt, isJson}`.
//! * [`GeminiGateway`] — calls the provider's `generateContent` directly.
//! * [`GatewayReply`] — the `{result}` / `{error}` envelope.
//! * [`GatewayError`] — transport and status failures, classified for retry.
//!
//! The dispatcher only ever talks to `Arc<dyn Gateway>`; tests substitute
//! scripted implementations.

pub mod gemini;
pub mod proxy;

#[cfg(test)]
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{GatewayConfig, GatewayMode};

pub use gemini::GeminiGateway;
pub use proxy::ProxyGateway;

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Errors that can occur while exchanging one request with the gateway.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// HTTP 429: the provider or proxy is throttling us.
    #[error("rate limited by gateway (HTTP 429)")]
    RateLimited,

    /// Connection-level failure (DNS, refused, reset, body read).
    #[error("network error: {0}")]
    Transport(String),

    /// The exchange did not complete within the configured timeout.
    #[error("gateway request timed out")]
    Timeout,

    /// Non-2xx status other than 429.
    #[error("gateway returned HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// The provider answered, but not in the expected shape.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// No credential is configured for a transport that needs one.
    #[error("API key not configured; set `gateway.api_key` or GEMINI_API_KEY")]
    MissingCredential,

    /// The request carried no prompt text.
    #[error("prompt is required")]
    EmptyPrompt,

    /// The proxy could not parse the model's JSON-mode output.
    #[error("gateway rejected malformed JSON: {0}")]
    MalformedJson(String),

    /// A 2xx body could not be decoded as a gateway envelope.
    #[error("could not decode gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether retrying the identical request may succeed.
    ///
    /// Only throttling and network-level failures qualify; everything else
    /// would fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited | GatewayError::Transport(_) | GatewayError::Timeout
        )
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body accepted by the passthrough endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRequest {
    pub prompt: String,
    #[serde(rename = "isJson")]
    pub is_json: bool,
}

impl GatewayRequest {
    pub fn new(prompt: impl Into<String>, is_json: bool) -> Self {
        Self {
            prompt: prompt.into(),
            is_json,
        }
    }
}

/// Response envelope: `{result}` on success, `{error}` on failure.
///
/// `result` is usually a string (possibly containing JSON), but some gateway
/// deployments pre-parse JSON-mode output and return an object, so it is
/// kept as a raw [`serde_json::Value`] for the normalizer to interpret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GatewayReply {
    /// A successful envelope carrying text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            result: Some(serde_json::Value::String(text.into())),
            error: None,
        }
    }

    /// An envelope reporting a gateway-side error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(message.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// One request/response exchange with the upstream gateway.
///
/// Implementors must be `Send + Sync` so they can be held behind an
/// `Arc<dyn Gateway>` by the dispatcher's worker task.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send(&self, request: &GatewayRequest) -> Result<GatewayReply, GatewayError>;
}

/// Build the gateway selected by `config.mode`.
pub fn from_config(config: &GatewayConfig) -> Arc<dyn Gateway> {
    match config.mode {
        GatewayMode::Proxy => Arc::new(ProxyGateway::from_config(config)),
        GatewayMode::Direct => Arc::new(GeminiGateway::from_config(config)),
    }
}

/// Shared HTTP client with the per-request timeout from `config`.
fn http_client(config: &GatewayConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
