//! Passthrough gateway: `POST {base_url}{endpoint}` with `{prompt, isJson}`.
//!
//! The proxy holds the provider credential server-side and answers with a
//! `{result}` or `{error}` envelope.  Status mapping:
//!
//! | Status   | Outcome                                     |
//! |----------|---------------------------------------------|
//! | 2xx      | decoded [`GatewayReply`]                    |
//! | 429      | [`GatewayError::RateLimited`]               |
//! | other    | [`GatewayError::Status`] with `error` text  |
//!
//! Two proxy `error` messages are its own failure modes rather than upstream
//! statuses: `"Invalid JSON response from AI"` becomes
//! [`GatewayError::MalformedJson`] and `"API key not configured"` becomes
//! [`GatewayError::MissingCredential`].

use async_trait::async_trait;

use crate::config::GatewayConfig;

use super::{http_client, Gateway, GatewayError, GatewayReply, GatewayRequest};

pub struct ProxyGateway {
    client: reqwest::Client,
    url: String,
}

impl ProxyGateway {
    /// Build a `ProxyGateway` from application config.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let url = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            config.endpoint
        );
        Self {
            client: http_client(config),
            url,
        }
    }

    /// Full endpoint URL requests are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Gateway for ProxyGateway {
    async fn send(&self, request: &GatewayRequest) -> Result<GatewayReply, GatewayError> {
        if request.prompt.trim().is_empty() {
            return Err(GatewayError::EmptyPrompt);
        }

        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::RateLimited);
        }

        let body = response.text().await?;

        if !status.is_success() {
            // Prefer the envelope's `error` field; fall back to the raw body.
            let message = serde_json::from_str::<GatewayReply>(&body)
                .ok()
                .and_then(|reply| reply.error)
                .unwrap_or(body);
            return Err(classify_status(status.as_u16(), message));
        }

        serde_json::from_str::<GatewayReply>(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

/// Envelope errors the proxy reports for its own failure modes.
const PROXY_INVALID_JSON: &str = "Invalid JSON response from AI";
const PROXY_MISSING_KEY: &str = "API key not configured";

/// Map a non-2xx proxy answer onto the error taxonomy.
fn classify_status(code: u16, message: String) -> GatewayError {
    let trimmed = message.trim();
    if trimmed == PROXY_INVALID_JSON {
        GatewayError::MalformedJson(message)
    } else if trimmed == PROXY_MISSING_KEY {
        GatewayError::MissingCredential
    } else {
        GatewayError::Status { code, message }
    }
}
