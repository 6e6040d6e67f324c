//! Conversation orchestrator — drives correction → vocabulary → reply → speech.
//!
//! [`ConversationPipeline`] owns the [`SharedState`] and responds to
//! [`ConversationEvent`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Turn flow
//!
//! ```text
//! Final transcript / typed text
//!   └─▶ pause recognizer
//!         └─▶ correction prompt          [Correcting]            ── Failure → Idle + error
//!               └─▶ vocabulary (JSON)    [SuggestingVocabulary]  ── Failure → no suggestion
//!                     └─▶ reply prompt   [ComposingReply]        ── Failure → Idle + error
//!                           └─▶ speak    [Speaking]
//!                                 └─▶ Idle; resume recognizer iff `listening`
//! ```
//!
//! The event channel is still read while a turn is running.  Start and stop
//! apply at once; transcripts are discarded.  A stop mid-turn abandons the
//! turn: whatever gateway call is in flight finishes, but its result is
//! dropped and nothing is spoken.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::dispatch::Dispatcher;
use crate::llm::prompt::{ENHANCED_SENTENCE_KEY, NO_SUGGESTION};
use crate::llm::{FailureReason, PromptBuilder};
use crate::speech::{RecognitionEvent, SpeechError, SpeechRecognizer, SpeechSynthesizer};

use super::state::{lock, new_shared_state, ConversationTurn, PipelineStage, SharedState};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Inputs to the orchestrator loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    /// Learner pressed start: enable hands-free listening.
    Start,
    /// Learner pressed stop: halt speech immediately.
    Stop,
    /// Event from the speech recognizer.
    Recognition(RecognitionEvent),
    /// Text typed instead of spoken.
    Typed(String),
}

/// Progress notifications for the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationUpdate {
    Stage(PipelineStage),
    Turn(ConversationTurn),
    Error(String),
    /// A transcript arrived mid-turn and was dropped.
    Discarded(String),
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("nothing to process")]
    EmptyTranscript,

    #[error("couldn't check that sentence: {0}")]
    Correction(FailureReason),

    #[error("couldn't come up with a reply: {0}")]
    Reply(FailureReason),

    /// The learner stopped the conversation before the turn finished.
    #[error("conversation stopped")]
    Stopped,
}

// ---------------------------------------------------------------------------
// ConversationControl
// ---------------------------------------------------------------------------

/// Start/stop handle, usable from any task while a turn is in flight.
///
/// Stop takes effect on the speech collaborators immediately and abandons
/// the turn in flight.  A gateway call already queued still runs to
/// completion; the turn discards its result at the next stage boundary.
#[derive(Clone)]
pub struct ConversationControl {
    state: SharedState,
    recognizer: Arc<dyn SpeechRecognizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl ConversationControl {
    pub fn start(&self) -> Result<(), SpeechError> {
        lock(&self.state).listening = true;
        if let Err(e) = self.recognizer.start() {
            lock(&self.state).listening = false;
            return Err(e);
        }
        log::info!("pipeline: listening");
        Ok(())
    }

    pub fn stop(&self) {
        {
            let mut st = lock(&self.state);
            st.listening = false;
            st.stop_generation = st.stop_generation.wrapping_add(1);
        }
        self.recognizer.stop();
        self.synthesizer.cancel();
        log::info!("pipeline: stopped listening");
    }

    pub fn is_listening(&self) -> bool {
        lock(&self.state).listening
    }

    fn stop_generation(&self) -> u64 {
        lock(&self.state).stop_generation
    }

    /// Restart capture after a turn, if the learner still wants it.
    fn resume_if_listening(&self) {
        if !self.is_listening() {
            return;
        }
        if let Err(e) = self.recognizer.start() {
            log::warn!("pipeline: could not resume recognition: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationPipeline
// ---------------------------------------------------------------------------

/// Drives one conversation session.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use language_coach::config::AppConfig;
/// use language_coach::dispatch::Dispatcher;
/// use language_coach::gateway;
/// use language_coach::llm::PromptBuilder;
/// use language_coach::pipeline::{ConversationEvent, ConversationPipeline};
/// use language_coach::speech::{ConsoleSynthesizer, TypedInputRecognizer};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let dispatcher = Dispatcher::spawn(gateway::from_config(&config.gateway), &config.dispatcher);
/// let pipeline = ConversationPipeline::new(
///     dispatcher,
///     PromptBuilder::new("English"),
///     Arc::new(TypedInputRecognizer::new()),
///     Arc::new(ConsoleSynthesizer::default()),
/// );
///
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// tx.send(ConversationEvent::Typed("I goed to the shop".into())).await.unwrap();
/// drop(tx);
/// pipeline.run(rx).await;
/// # }
/// ```
pub struct ConversationPipeline {
    dispatcher: Dispatcher,
    prompts: PromptBuilder,
    control: ConversationControl,
    state: SharedState,
    updates: Option<mpsc::UnboundedSender<ConversationUpdate>>,
}

impl ConversationPipeline {
    pub fn new(
        dispatcher: Dispatcher,
        prompts: PromptBuilder,
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let state = new_shared_state();
        let control = ConversationControl {
            state: Arc::clone(&state),
            recognizer,
            synthesizer,
        };
        Self {
            dispatcher,
            prompts,
            control,
            state,
            updates: None,
        }
    }

    /// Push [`ConversationUpdate`]s to `tx` as the session progresses.
    pub fn with_updates(mut self, tx: mpsc::UnboundedSender<ConversationUpdate>) -> Self {
        self.updates = Some(tx);
        self
    }

    pub fn control(&self) -> ConversationControl {
        self.control.clone()
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `events` is closed.
    pub async fn run(self, mut events: mpsc::Receiver<ConversationEvent>) {
        let mut closed = false;

        while !closed {
            let Some(event) = events.recv().await else {
                break;
            };
            let text = match event {
                ConversationEvent::Start => {
                    self.start();
                    continue;
                }
                ConversationEvent::Stop => {
                    self.control.stop();
                    continue;
                }
                ConversationEvent::Recognition(RecognitionEvent::Interim(_)) => continue,
                ConversationEvent::Recognition(RecognitionEvent::Final(text))
                | ConversationEvent::Typed(text) => text,
            };

            // Keep reading events so a stop lands mid-turn.  Failures are
            // already recorded in state and reported.
            let turn = self.handle_transcript(&text);
            tokio::pin!(turn);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut turn => break,
                    event = events.recv(), if !closed => match event {
                        Some(event) => self.apply_mid_turn(event),
                        None => closed = true,
                    },
                }
            }
        }

        log::info!("pipeline: event channel closed, conversation ending");
    }

    // -----------------------------------------------------------------------
    // Turn processing
    // -----------------------------------------------------------------------

    /// Run one full turn for `transcript`.
    ///
    /// Returns [`PipelineError::Stopped`] if the conversation was stopped
    /// before the reply could be spoken; the turn is then not recorded.
    pub async fn handle_transcript(
        &self,
        transcript: &str,
    ) -> Result<ConversationTurn, PipelineError> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(PipelineError::EmptyTranscript);
        }

        // Recognition stays paused for the whole turn.
        self.control.recognizer.stop();
        let generation = {
            let mut st = lock(&self.state);
            st.error_message = None;
            st.stop_generation
        };

        let turn = match self.compose_turn(transcript, generation).await {
            Ok(turn) => turn,
            Err(PipelineError::Stopped) => {
                log::info!("pipeline: turn abandoned after stop");
                self.set_stage(PipelineStage::Idle);
                self.control.resume_if_listening();
                return Err(PipelineError::Stopped);
            }
            Err(e) => {
                self.set_error(e.to_string());
                self.control.resume_if_listening();
                return Err(e);
            }
        };

        {
            let mut st = lock(&self.state);
            st.last_turn = Some(turn.clone());
            st.turns_completed += 1;
        }
        self.notify(ConversationUpdate::Turn(turn.clone()));

        self.set_stage(PipelineStage::Speaking);
        if let Err(e) = self.control.synthesizer.speak(&turn.reply).await {
            log::warn!("pipeline: speech synthesis failed: {e}");
        }
        self.set_stage(PipelineStage::Idle);

        self.control.resume_if_listening();
        Ok(turn)
    }

    async fn compose_turn(
        &self,
        transcript: &str,
        generation: u64,
    ) -> Result<ConversationTurn, PipelineError> {
        // ── 1. Correction ────────────────────────────────────────────────
        self.set_stage(PipelineStage::Correcting);
        let corrected = self
            .dispatcher
            .submit(self.prompts.correction(transcript), false)
            .await;
        self.ensure_running(generation)?;
        let corrected = corrected.into_text().map_err(PipelineError::Correction)?;
        let corrected = corrected.trim().to_string();
        if corrected.is_empty() {
            return Err(PipelineError::Correction(FailureReason::Upstream(
                "empty response".into(),
            )));
        }
        log::debug!("pipeline: corrected = {corrected:?}");

        // ── 2. Vocabulary ────────────────────────────────────────────────
        self.set_stage(PipelineStage::SuggestingVocabulary);
        let vocabulary = self
            .dispatcher
            .submit(self.prompts.vocabulary(&corrected), true)
            .await;
        self.ensure_running(generation)?;
        let suggestion = match vocabulary.into_structured() {
            Ok(payload) => parse_suggestion(&payload),
            Err(reason) => {
                log::warn!("pipeline: vocabulary stage failed ({reason}); skipping suggestion");
                None
            }
        };

        // ── 3. Reply ─────────────────────────────────────────────────────
        self.set_stage(PipelineStage::ComposingReply);
        let reply = self
            .dispatcher
            .submit(self.prompts.reply(&corrected), false)
            .await;
        self.ensure_running(generation)?;
        let reply = reply.into_text().map_err(PipelineError::Reply)?;

        Ok(ConversationTurn {
            transcript: transcript.to_string(),
            corrected,
            suggestion,
            reply: reply.trim().to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn start(&self) {
        if let Err(e) = self.control.start() {
            self.set_error(e.to_string());
        }
    }

    /// Fails with [`PipelineError::Stopped`] once a stop has landed since
    /// the turn began.
    fn ensure_running(&self, generation: u64) -> Result<(), PipelineError> {
        if self.control.stop_generation() == generation {
            Ok(())
        } else {
            Err(PipelineError::Stopped)
        }
    }

    /// Apply an event that arrived while a turn is running.
    fn apply_mid_turn(&self, event: ConversationEvent) {
        match event {
            // Recognition stays paused; the turn resumes it when done.
            ConversationEvent::Start => lock(&self.state).listening = true,
            ConversationEvent::Stop => self.control.stop(),
            ConversationEvent::Recognition(RecognitionEvent::Interim(_)) => {}
            ConversationEvent::Recognition(RecognitionEvent::Final(text))
            | ConversationEvent::Typed(text) => {
                log::info!("pipeline: discarding transcript received mid-turn");
                self.notify(ConversationUpdate::Discarded(text));
            }
        }
    }

    fn set_stage(&self, stage: PipelineStage) {
        lock(&self.state).stage = stage;
        log::debug!("pipeline: → {}", stage.label());
        self.notify(ConversationUpdate::Stage(stage));
    }

    fn set_error(&self, message: String) {
        {
            let mut st = lock(&self.state);
            st.stage = PipelineStage::Idle;
            st.error_message = Some(message.clone());
        }
        log::error!("pipeline error: {message}");
        self.notify(ConversationUpdate::Error(message));
    }

    fn notify(&self, update: ConversationUpdate) {
        if let Some(tx) = &self.updates {
            let _ = tx.send(update);
        }
    }
}

/// Read the vocabulary payload.  A blank value or the `"none"` sentinel (any
/// case) means no suggestion; anything else is returned verbatim.
pub fn parse_suggestion(payload: &Value) -> Option<String> {
    let sentence = payload.get(ENHANCED_SENTENCE_KEY)?.as_str()?;
    let trimmed = sentence.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_SUGGESTION) {
        None
    } else {
        Some(sentence.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
