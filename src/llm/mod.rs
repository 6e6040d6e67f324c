//! Prompt construction, response normalization and the coach features.
//!
//! This module provides:
//! * [`normalize`] / [`normalize_reply`] — raw gateway output → [`NormalizedResult`].
//! * [`FailureReason`] — typed failure markers settled by the dispatcher.
//! * [`PromptBuilder`] — every prompt the coach sends.
//! * [`Coach`] — single-shot speech analysis, text correction and word insights.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use language_coach::config::AppConfig;
//! use language_coach::dispatch::Dispatcher;
//! use language_coach::gateway;
//! use language_coach::llm::{Coach, PromptBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let dispatcher =
//!         Dispatcher::spawn(gateway::from_config(&config.gateway), &config.dispatcher);
//!
//!     let coach = Coach::new(dispatcher, PromptBuilder::new("English"));
//!     match coach.correct_text("their going to the park tomorow").await {
//!         Ok(feedback) => println!("{feedback}"),
//!         Err(e) => println!("{e}"),
//!     }
//! }
//! ```

pub mod coach;
pub mod normalize;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use coach::{Coach, CoachError, CoachFeature};
pub use normalize::{normalize, normalize_reply, FailureReason, NormalizedResult};
pub use prompt::PromptBuilder;
