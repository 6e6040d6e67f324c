//! Multiple-choice question type and the generated-question payload.

use serde::Deserialize;

use super::QuizError;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// One validated multiple-choice question.
///
/// Immutable once built: the text and options are non-blank and
/// `correct_index` is always in `0..OPTION_COUNT`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizQuestion {
    text: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
    explanation: Option<String>,
}

impl QuizQuestion {
    /// Build a question, trimming every string.
    ///
    /// ```
    /// use language_coach::quiz::QuizQuestion;
    ///
    /// let q = QuizQuestion::new(
    ///     "Pick the past tense of 'go'",
    ///     ["goed", "went", "gone", "going"],
    ///     1,
    /// ).unwrap();
    /// assert!(q.is_correct(1));
    /// assert!(!q.is_correct(2));
    /// ```
    pub fn new(
        text: impl Into<String>,
        options: [impl Into<String>; OPTION_COUNT],
        correct_index: usize,
    ) -> Result<Self, QuizError> {
        let text: String = text.into();
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(QuizError::InvalidQuestion("question text is blank".into()));
        }

        let options = options.map(|o| {
            let o: String = o.into();
            o.trim().to_string()
        });
        if let Some(i) = options.iter().position(|o| o.is_empty()) {
            return Err(QuizError::InvalidQuestion(format!("option {i} is blank")));
        }

        if correct_index >= OPTION_COUNT {
            return Err(QuizError::InvalidQuestion(format!(
                "correct index {correct_index} is out of range"
            )));
        }

        Ok(Self {
            text,
            options,
            correct_index,
            explanation: None,
        })
    }

    /// Attach an explanation; blank text is dropped.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation: String = explanation.into();
        let explanation = explanation.trim().to_string();
        self.explanation = (!explanation.is_empty()).then_some(explanation);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

// ---------------------------------------------------------------------------
// GeneratedQuestion
// ---------------------------------------------------------------------------

/// The JSON shape the model is asked to produce for a fresh question.
///
/// `correctAnswerIndex` is the requested key; `correctIndex` is accepted too.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswerIndex", alias = "correctIndex")]
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl GeneratedQuestion {
    /// Decode a structured gateway result.
    pub fn from_value(value: serde_json::Value) -> Result<Self, QuizError> {
        serde_json::from_value(value).map_err(|e| QuizError::InvalidQuestion(e.to_string()))
    }
}

impl TryFrom<GeneratedQuestion> for QuizQuestion {
    type Error = QuizError;

    fn try_from(generated: GeneratedQuestion) -> Result<Self, Self::Error> {
        let count = generated.options.len();
        let options: [String; OPTION_COUNT] = generated.options.try_into().map_err(|_| {
            QuizError::InvalidQuestion(format!("expected {OPTION_COUNT} options, got {count}"))
        })?;

        let question = QuizQuestion::new(generated.question, options, generated.correct_index)?;
        Ok(match generated.explanation {
            Some(explanation) => question.with_explanation(explanation),
            None => question,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
