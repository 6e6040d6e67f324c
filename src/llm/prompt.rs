//! Prompt builder for every call the coach makes.
//!
//! [`PromptBuilder`] produces single-string prompts for the gateway.  Three
//! families exist:
//! * **Conversation** — `correction`, `vocabulary` (JSON), `reply`; chained
//!   by the conversation pipeline.
//! * **Quiz** — `quiz_question` (JSON).
//! * **Coach** — `speech_analysis`, `text_correction`, `word_insights`.
//!
//! The learner's target language is fixed at construction time.

/// Key the vocabulary prompt asks the model to fill.
pub const ENHANCED_SENTENCE_KEY: &str = "enhanced_sentence";

/// Sentinel the model returns when it has no better phrasing to offer.
pub const NO_SUGGESTION: &str = "none";

const QUIZ_SCHEMA: &str = r#"{
  "question": "the question text",
  "options": ["option A", "option B", "option C", "option D"],
  "correctAnswerIndex": 0,
  "explanation": "one sentence on why the answer is correct"
}"#;

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the gateway prompts for one target language.
///
/// # Example
/// ```rust
/// use language_coach::llm::PromptBuilder;
///
/// let builder = PromptBuilder::new("English");
/// let prompt = builder.correction("me go school yesterday");
/// assert!(prompt.contains("me go school yesterday"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: String,
}

impl PromptBuilder {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    // -----------------------------------------------------------------------
    // Conversation pipeline
    // -----------------------------------------------------------------------

    /// Stage 1: grammar correction of a raw transcript.  Plain text reply.
    pub fn correction(&self, transcript: &str) -> String {
        format!(
            "You are a friendly {lang} tutor. A learner said the sentence below.\n\
             Correct its grammar, word choice and punctuation while keeping the meaning.\n\
             Reply with ONLY the corrected sentence, no explanation.\n\
             If the sentence is already correct, reply with it unchanged.\n\n\
             Sentence: \"{transcript}\"",
            lang = self.language,
        )
    }

    /// Stage 2: a more natural or richer phrasing.  JSON reply.
    pub fn vocabulary(&self, corrected: &str) -> String {
        format!(
            "You are a {lang} vocabulary coach. Suggest a more natural or more \
             expressive way to say the sentence below, using vocabulary slightly \
             above the learner's level.\n\
             Respond with JSON only, in the form {{\"{key}\": \"...\"}}.\n\
             If the sentence cannot be meaningfully improved, use \"{none}\" as the value.\n\n\
             Sentence: \"{corrected}\"",
            lang = self.language,
            key = ENHANCED_SENTENCE_KEY,
            none = NO_SUGGESTION,
        )
    }

    /// Stage 3: short encouraging reply plus one follow-up question.
    pub fn reply(&self, corrected: &str) -> String {
        format!(
            "You are a warm {lang} conversation partner helping a learner practise speaking.\n\
             The learner just said: \"{corrected}\"\n\
             Reply in {lang} with one or two short, encouraging sentences that respond \
             to what they said, then ask ONE simple follow-up question to keep the \
             conversation going. Do not correct their grammar.",
            lang = self.language,
        )
    }

    // -----------------------------------------------------------------------
    // Quiz
    // -----------------------------------------------------------------------

    /// One multiple-choice grammar/communication question.  JSON reply.
    pub fn quiz_question(&self) -> String {
        format!(
            "Generate ONE multiple-choice question that tests {lang} grammar, vocabulary \
             or everyday communication for an intermediate learner.\n\
             It must have exactly 4 options and exactly one correct answer.\n\
             Respond with JSON only, in this shape:\n{schema}",
            lang = self.language,
            schema = QUIZ_SCHEMA,
        )
    }

    // -----------------------------------------------------------------------
    // Coach features
    // -----------------------------------------------------------------------

    pub fn speech_analysis(&self, speech: &str) -> String {
        format!(
            "You are a {lang} speech coach. Analyze this speech and provide: \
             1) Grammatical corrections, 2) Clarity suggestions, \
             3) Tone improvement tips, 4) Overall feedback.\n\n\
             Speech: \"{speech}\"",
            lang = self.language,
        )
    }

    pub fn text_correction(&self, text: &str) -> String {
        format!(
            "Correct the following {lang} text for grammar, punctuation, and clarity. \
             Provide the corrected version and explain key changes:\n\n\"{text}\"",
            lang = self.language,
        )
    }

    pub fn word_insights(&self, word: &str) -> String {
        format!(
            "For the {lang} word \"{word}\", provide: 1) Definition, 2) Synonyms (3-5), \
             3) Antonyms (2-3), 4) Example sentences (2), 5) Common usage tips. \
             Format as clear sections.",
            lang = self.language,
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new("English")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
