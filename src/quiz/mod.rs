//! Multiple-choice quiz mixing a built-in bank with generated questions.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`QuizQuestion`] | validated question (4 options, one correct) |
//! | [`QuestionBank`] | built-in questions; fallback for failed generation |
//! | [`SourcePolicy`] | bank vs. generated choice, bank index draw |
//! | [`QuizEngine`] | next / answer / advance / restart state machine |

pub mod bank;
pub mod engine;
pub mod question;
pub mod source;

#[cfg(test)]
pub mod mock;

use thiserror::Error;

use crate::llm::FailureReason;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use bank::QuestionBank;
pub use engine::{AnswerOutcome, QuizEngine, QuizSession};
pub use question::{GeneratedQuestion, QuizQuestion, OPTION_COUNT};
pub use source::{QuestionSource, RandomPolicy, SourcePolicy};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuizError {
    #[error("no question has been loaded")]
    NoQuestion,

    #[error("this question has already been answered")]
    AlreadyAnswered,

    #[error("answer {0} is out of range (expected 0-3)")]
    OutOfRange(usize),

    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    #[error("question bank is empty")]
    EmptyBank,

    #[error("question generation failed: {0}")]
    Generation(FailureReason),
}
