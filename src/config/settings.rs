//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` fills
//! the missing keys from the defaults below.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable consulted when no API key is present in the config.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ---------------------------------------------------------------------------
// GatewayMode
// ---------------------------------------------------------------------------

/// Selects how prompts reach the generative-language provider.
///
/// | Variant | Transport                                             | Needs key locally |
/// |---------|-------------------------------------------------------|-------------------|
/// | Proxy   | `POST {base_url}{endpoint}` with `{prompt, isJson}`   | No                |
/// | Direct  | `generateContent` on the provider API                 | Yes               |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GatewayMode {
    /// Talk to the passthrough endpoint, which holds the credential.
    Proxy,
    /// Call the provider directly with a locally configured credential.
    Direct,
}

impl Default for GatewayMode {
    fn default() -> Self {
        Self::Proxy
    }
}

// ---------------------------------------------------------------------------
// GatewayConfig
// ---------------------------------------------------------------------------

/// Connection settings for the upstream gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Which transport to use.
    pub mode: GatewayMode,
    /// Base URL of the passthrough proxy (Proxy mode).
    pub base_url: String,
    /// Path of the proxy endpoint.
    pub endpoint: String,
    /// Base URL of the provider API (Direct mode).
    pub provider_url: String,
    /// Provider credential for Direct mode.  Falls back to `GEMINI_API_KEY`.
    pub api_key: Option<String>,
    /// Model identifier used in Direct mode.
    pub model: String,
    /// Maximum seconds to wait for one HTTP exchange.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mode: GatewayMode::default(),
            base_url: "http://localhost:3000".into(),
            endpoint: "/api/gemini".into(),
            provider_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            model: "gemini-2.0-flash".into(),
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// The credential to use: the configured key if non-empty, otherwise the
    /// `GEMINI_API_KEY` environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), std::env::var(API_KEY_ENV).ok())
    }
}

fn resolve_api_key(configured: Option<&str>, from_env: Option<String>) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| {
            from_env
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
}

// ---------------------------------------------------------------------------
// DispatcherConfig
// ---------------------------------------------------------------------------

/// Pacing, rate-limit and retry settings for the request dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Pause between two dispatches while the queue is non-empty.
    pub request_spacing_ms: u64,
    /// Maximum transmissions per rate window.
    pub rate_limit: u32,
    /// Length of the rolling rate window in seconds.
    pub rate_window_secs: u64,
    /// How long dispatch is suspended once the ceiling is reached.
    pub cooldown_ms: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Linear backoff unit: retry `k` waits `base_delay_ms * k`.
    pub base_delay_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            request_spacing_ms: 500,
            rate_limit: 55,
            rate_window_secs: 60,
            cooldown_ms: 5_000,
            max_retries: 3,
            base_delay_ms: 1_000,
        }
    }
}

impl DispatcherConfig {
    pub fn request_spacing(&self) -> Duration {
        Duration::from_millis(self.request_spacing_ms)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// QuizConfig
// ---------------------------------------------------------------------------

/// Quiz question sourcing and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Probability (0.0 – 1.0) that the next question is generated rather
    /// than drawn from the built-in bank.
    pub generated_probability: f64,
    /// Pause after an answer before the next question is loaded.
    pub reveal_delay_ms: u64,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            generated_probability: 0.3,
            reveal_delay_ms: 2_500,
        }
    }
}

impl QuizConfig {
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// CoachConfig
// ---------------------------------------------------------------------------

/// Prompt wording settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// The language the learner is practising, as it should appear in prompts.
    pub target_language: String,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            target_language: "English".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use language_coach::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upstream gateway connection.
    pub gateway: GatewayConfig,
    /// Request queue pacing and retry policy.
    pub dispatcher: DispatcherConfig,
    /// Quiz engine settings.
    pub quiz: QuizConfig,
    /// Prompt wording.
    pub coach: CoachConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
