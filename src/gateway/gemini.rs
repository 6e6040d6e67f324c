//! Direct gateway to the generative-language `generateContent` API.
//!
//! Builds the same payload the passthrough proxy builds server-side:
//!
//! ```text
//! POST {provider_url}/v1beta/models/{model}:generateContent?key=…
//! { "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
//!   "generationConfig": { "responseMimeType": "application/json" } }   ← JSON mode only
//! ```
//!
//! and wraps `candidates[0].content.parts[0].text` in a [`GatewayReply`], so
//! the dispatcher cannot tell the two transports apart.

use async_trait::async_trait;

use crate::config::GatewayConfig;

use super::{http_client, Gateway, GatewayError, GatewayReply, GatewayRequest};

pub struct GeminiGateway {
    client: reqwest::Client,
    provider_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiGateway {
    /// Build a `GeminiGateway` from application config.
    ///
    /// The credential is resolved once here; a missing key is not an error
    /// until the first [`send`](Gateway::send).
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            client: http_client(config),
            provider_url: config.provider_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.resolved_api_key(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.provider_url, self.model
        )
    }
}

/// Provider request body for one single-turn prompt.
fn build_payload(prompt: &str, json_mode: bool) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {}
    });
    if json_mode {
        payload["generationConfig"]["responseMimeType"] = "application/json".into();
    }
    payload
}

/// Pull the first candidate's text out of a provider response.
fn extract_text(response: &serde_json::Value) -> Option<&str> {
    response["candidates"][0]["content"]["parts"][0]["text"].as_str()
}

#[async_trait]
impl Gateway for GeminiGateway {
    async fn send(&self, request: &GatewayRequest) -> Result<GatewayReply, GatewayError> {
        // Fail fast: nothing goes on the wire without a credential.
        let key = self
            .api_key
            .as_deref()
            .ok_or(GatewayError::MissingCredential)?;

        if request.prompt.trim().is_empty() {
            return Err(GatewayError::EmptyPrompt);
        }

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&build_payload(&request.prompt, request.is_json))
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await?;
            return Err(GatewayError::Status {
                code: status.as_u16(),
                message: format!("Gemini API Error: {body}"),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let text = extract_text(&json)
            .ok_or_else(|| GatewayError::Upstream("Unexpected API response structure".into()))?;

        log::debug!("gateway: provider returned {} chars", text.len());
        Ok(GatewayReply::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_sets_mime_type_only_in_json_mode() {
        let plain = build_payload("hello", false);
        assert_eq!(plain["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(plain["contents"][0]["role"], "user");
        assert!(plain["generationConfig"]["responseMimeType"].is_null());

        let json = build_payload("hello", true);
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn extract_text_follows_first_candidate() {
        let response = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Bonjour" }] } }]
        });
        assert_eq!(extract_text(&response), Some("Bonjour"));
        assert_eq!(extract_text(&serde_json::json!({ "candidates": [] })), None);
    }

    #[test]
    fn endpoint_embeds_model() {
        let mut config = GatewayConfig::default();
        config.provider_url = "https://provider.example/".into();
        config.model = "gemini-test".into();
        let gateway = GeminiGateway::from_config(&config);
        assert_eq!(
            gateway.endpoint(),
            "https://provider.example/v1beta/models/gemini-test:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_credential_fails_before_network() {
        let mut config = GatewayConfig::default();
        config.provider_url = "http://127.0.0.1:9".into();
        let mut gateway = GeminiGateway::from_config(&config);
        // Ignore whatever the environment provides.
        gateway.api_key = None;

        let err = gateway
            .send(&GatewayRequest::new("hello", false))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::MissingCredential);
    }
}
