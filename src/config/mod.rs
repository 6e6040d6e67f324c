//! Configuration module for the language coach.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for locating the settings file, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::{AppPaths, CONFIG_PATH_ENV};
pub use settings::{
    AppConfig, CoachConfig, DispatcherConfig, GatewayConfig, GatewayMode, QuizConfig,
    API_KEY_ENV,
};
