//! Conversation pipeline for the speaking coach.
//!
//! Each final transcript becomes one turn of three chained gateway calls
//! followed by speech, with the shared state the UI reads in between.
//!
//! # Architecture
//!
//! ```text
//! ConversationEvent (mpsc)
//!        │
//!        ▼
//! ConversationPipeline::run()  ← async tokio task
//!        │
//!        ├─ Start / Stop            → ConversationControl (listening flag)
//!        ├─ Interim                 → ignored
//!        └─ Final / Typed
//!              │
//!              ├─ Dispatcher::submit(correction, text)  → Correcting
//!              ├─ Dispatcher::submit(vocabulary, JSON)  → SuggestingVocabulary
//!              ├─ Dispatcher::submit(reply, text)       → ComposingReply
//!              └─ SpeechSynthesizer::speak              → Speaking
//!
//! SharedState (Arc<Mutex<ConversationState>>) ←─── read by the UI
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{
    parse_suggestion, ConversationControl, ConversationEvent, ConversationPipeline,
    ConversationUpdate, PipelineError,
};
pub use state::{new_shared_state, ConversationState, ConversationTurn, PipelineStage, SharedState};
