//! Terminal stand-ins for the speech collaborators.
//!
//! Replies are "spoken" by printing them; transcripts arrive as typed lines,
//! so the recognizer only tracks whether capture is logically active.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{SpeechError, SpeechRecognizer, SpeechSynthesizer};

/// Recognizer for keyboard input: start/stop only toggle a flag.
#[derive(Debug, Default)]
pub struct TypedInputRecognizer {
    active: AtomicBool,
}

impl TypedInputRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for TypedInputRecognizer {
    fn start(&self) -> Result<(), SpeechError> {
        if !self.active.swap(true, Ordering::SeqCst) {
            log::debug!("speech: typed input capture on");
        }
        Ok(())
    }

    fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            log::debug!("speech: typed input capture off");
        }
    }
}

/// Synthesizer that writes the utterance to stdout.
#[derive(Debug)]
pub struct ConsoleSynthesizer {
    prefix: String,
}

impl ConsoleSynthesizer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new("Coach")
    }
}

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}: {}", self.prefix, text)
            .and_then(|_| out.flush())
            .map_err(|e| SpeechError::Synthesis(e.to_string()))
    }

    fn cancel(&self) {}
}
