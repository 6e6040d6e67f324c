//! Conversation stage machine and shared session state.
//!
//! [`PipelineStage`] drives the orchestrator.  The UI reads it through
//! [`SharedState`] to show what the coach is doing.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<ConversationState>>`.
//! Never hold the lock across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// PipelineStage
// ---------------------------------------------------------------------------

/// Stages of one conversation turn.
///
/// ```text
/// Idle ──final transcript──▶ Correcting
///                              ──ok──▶ SuggestingVocabulary
///                                        ──(any)──▶ ComposingReply
///                                                     ──ok──▶ Speaking ──end──▶ Idle
/// Correcting / ComposingReply ──failure──▶ Idle (+ error message)
/// any busy stage ──stop──▶ Idle (turn dropped, nothing spoken)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    #[default]
    Idle,
    Correcting,
    SuggestingVocabulary,
    ComposingReply,
    Speaking,
}

impl PipelineStage {
    /// `true` while a turn is in progress.
    ///
    /// ```
    /// use language_coach::pipeline::PipelineStage;
    ///
    /// assert!(!PipelineStage::Idle.is_busy());
    /// assert!(PipelineStage::Correcting.is_busy());
    /// assert!(PipelineStage::Speaking.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(self, PipelineStage::Idle)
    }

    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "Ready",
            PipelineStage::Correcting => "Checking grammar",
            PipelineStage::SuggestingVocabulary => "Looking for better words",
            PipelineStage::ComposingReply => "Thinking of a reply",
            PipelineStage::Speaking => "Speaking",
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationTurn
// ---------------------------------------------------------------------------

/// Everything the coach produced for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    /// What the learner said (trimmed).
    pub transcript: String,
    /// Grammar-corrected sentence.
    pub corrected: String,
    /// Richer phrasing, when the model offered one.
    pub suggestion: Option<String>,
    /// Encouraging reply plus follow-up question.
    pub reply: String,
}

// ---------------------------------------------------------------------------
// ConversationState
// ---------------------------------------------------------------------------

/// Shared conversation state read by the UI.
#[derive(Debug, Default)]
pub struct ConversationState {
    /// Current stage of the turn in progress.
    pub stage: PipelineStage,

    /// Whether the learner wants hands-free turn-taking.
    ///
    /// Set by start, cleared by stop.  When a reply finishes speaking,
    /// recognition resumes only if this is still `true`.
    pub listening: bool,

    /// The most recently completed turn.
    pub last_turn: Option<ConversationTurn>,

    /// Message for the last failed turn; cleared when a new turn starts.
    pub error_message: Option<String>,

    pub turns_completed: usize,

    /// Bumped on every stop.  A turn that sees it change mid-flight is
    /// abandoned without speaking.
    pub stop_generation: u64,
}

/// Thread-safe handle to [`ConversationState`].
pub type SharedState = Arc<Mutex<ConversationState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(ConversationState::default()))
}

/// Lock `state`, recovering the guard if a previous holder panicked.
pub(crate) fn lock(state: &SharedState) -> MutexGuard<'_, ConversationState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_is_not_busy() {
        assert!(!PipelineStage::Idle.is_busy());
        for stage in [
            PipelineStage::Correcting,
            PipelineStage::SuggestingVocabulary,
            PipelineStage::ComposingReply,
            PipelineStage::Speaking,
        ] {
            assert!(stage.is_busy(), "{stage:?} should be busy");
        }
    }

    #[test]
    fn labels() {
        assert_eq!(PipelineStage::Idle.label(), "Ready");
        assert_eq!(PipelineStage::Speaking.label(), "Speaking");
    }

    #[test]
    fn default_state_is_idle_and_not_listening() {
        let state = ConversationState::default();
        assert_eq!(state.stage, PipelineStage::Idle);
        assert!(!state.listening);
        assert!(state.last_turn.is_none());
        assert_eq!(state.turns_completed, 0);
        assert_eq!(state.stop_generation, 0);
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }

    #[test]
    fn shared_state_can_be_cloned_and_mutated() {
        let state = new_shared_state();
        let state2 = Arc::clone(&state);

        lock(&state).listening = true;
        assert!(lock(&state2).listening);
    }
}
