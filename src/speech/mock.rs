//! Recording speech doubles (compiled for tests only).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{SpeechError, SpeechRecognizer, SpeechSynthesizer};

/// Counts `start` / `stop` calls.
#[derive(Debug, Default)]
pub struct MockRecognizer {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl MockRecognizer {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn start(&self) -> Result<(), SpeechError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

type SpeakHook = Box<dyn Fn() + Send + Sync>;

/// Records every utterance; optionally runs a hook while "speaking".
#[derive(Default)]
pub struct MockSynthesizer {
    spoken: Mutex<Vec<String>>,
    cancels: AtomicUsize,
    on_speak: Mutex<Option<SpeakHook>>,
}

impl MockSynthesizer {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Run `hook` in the middle of every utterance.
    pub fn set_on_speak(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_speak.lock().unwrap() = Some(Box::new(hook));
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(text.to_string());
        if let Some(hook) = self.on_speak.lock().unwrap().as_ref() {
            hook();
        }
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}
