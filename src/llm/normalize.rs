//! Response normalizer — turns raw gateway output into a [`NormalizedResult`].
//!
//! | Input                          | `json_mode = false` | `json_mode = true`          |
//! |--------------------------------|---------------------|-----------------------------|
//! | envelope with `error`          | `Failure(Upstream)` | `Failure(Upstream)`         |
//! | string result                  | `Text` (verbatim)   | strip fences → parse        |
//! | structured result              | `Text` (rendered)   | `Structured` as-is          |
//! | unparseable string             | —                   | `Failure(InvalidJson)`      |

use serde_json::Value;
use thiserror::Error;

use crate::gateway::GatewayReply;

// ---------------------------------------------------------------------------
// FailureReason
// ---------------------------------------------------------------------------

/// Why a submission produced no usable payload.
///
/// Every variant's `Display` is safe to show to the learner.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureReason {
    /// JSON mode was requested but the model's text did not parse.
    #[error("invalid JSON response")]
    InvalidJson,

    /// The gateway reported an error in its envelope.
    #[error("{0}")]
    Upstream(String),

    /// A transient failure persisted through every retry.
    #[error("request failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// The gateway refused the request in a way retrying cannot fix.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Required configuration (e.g. the credential) is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The dispatcher worker is no longer running.
    #[error("request dispatcher is not running")]
    Unavailable,
}

// ---------------------------------------------------------------------------
// NormalizedResult
// ---------------------------------------------------------------------------

/// Outcome of one submission: exactly one of text, structured data, or a
/// failure marker.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResult {
    Text(String),
    Structured(Value),
    Failure(FailureReason),
}

impl NormalizedResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, NormalizedResult::Failure(_))
    }

    /// The payload as text.  Structured payloads are rendered as compact JSON.
    pub fn into_text(self) -> Result<String, FailureReason> {
        match self {
            NormalizedResult::Text(text) => Ok(text),
            NormalizedResult::Structured(value) => Ok(value.to_string()),
            NormalizedResult::Failure(reason) => Err(reason),
        }
    }

    /// The payload as structured data.  A text payload counts as malformed.
    pub fn into_structured(self) -> Result<Value, FailureReason> {
        match self {
            NormalizedResult::Structured(value) => Ok(value),
            NormalizedResult::Text(_) => Err(FailureReason::InvalidJson),
            NormalizedResult::Failure(reason) => Err(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize model text.
///
/// Outside JSON mode this is the identity on `raw`.  In JSON mode, fenced
/// code-block markers are stripped before parsing.
pub fn normalize(raw: &str, json_mode: bool) -> NormalizedResult {
    if !json_mode {
        return NormalizedResult::Text(raw.to_string());
    }

    match serde_json::from_str::<Value>(strip_fences(raw)) {
        Ok(value) => NormalizedResult::Structured(value),
        Err(e) => {
            log::debug!("normalize: JSON parse failed ({e}); raw len={}", raw.len());
            NormalizedResult::Failure(FailureReason::InvalidJson)
        }
    }
}

/// Normalize a full gateway envelope.  An `error` field wins over any result.
pub fn normalize_reply(reply: GatewayReply, json_mode: bool) -> NormalizedResult {
    if let Some(error) = reply.error {
        return NormalizedResult::Failure(FailureReason::Upstream(error));
    }

    match reply.result {
        None | Some(Value::Null) => {
            NormalizedResult::Failure(FailureReason::Upstream("empty response from gateway".into()))
        }
        Some(Value::String(text)) => normalize(&text, json_mode),
        Some(value) if json_mode => NormalizedResult::Structured(value),
        Some(value) => NormalizedResult::Text(value.to_string()),
    }
}

/// Remove a surrounding ```` ```json ```` / ```` ``` ```` fence and whitespace.
fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Language tag, if any, runs up to the first newline or brace.
        let tag_len = rest
            .find(|c: char| c == '\n' || c == '{' || c == '[')
            .unwrap_or(rest.len());
        let tag = &rest[..tag_len];
        text = if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
            &rest[tag_len..]
        } else {
            rest
        };
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
