//! Speech collaborators consumed by the conversation pipeline.
//!
//! The pipeline never touches audio.  It sees two narrow seams:
//!
//! ```text
//!   SpeechRecognizer ── RecognitionEvent::{Interim, Final} ──▶ pipeline
//!         ▲ start()/stop()                                        │
//!         └──────────── resume when `listening` ◀── speak() done ◀┘
//!                                       SpeechSynthesizer
//! ```
//!
//! Real engines (browser, OS, cloud) implement these traits outside this
//! crate; [`console`] provides the terminal stand-ins used by the binary.

pub mod console;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

pub use console::{ConsoleSynthesizer, TypedInputRecognizer};

/// Errors reported by the speech collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    /// Recognition could not be started (no device, permission denied …).
    #[error("speech recognition unavailable: {0}")]
    RecognitionUnavailable(String),

    /// Synthesis failed part-way or could not start.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

/// Transcript events emitted by a recognizer.  Only `Final` drives a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Interim(String),
    Final(String),
}

/// Speech-to-text capture control.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin (or resume) capture.
    fn start(&self) -> Result<(), SpeechError>;
    /// Pause capture.  Idempotent.
    fn stop(&self);
}

/// Text-to-speech output.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text`; resolves at end of speech (or when cancelled).
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
    /// Cut off any utterance in progress.
    fn cancel(&self);
}
