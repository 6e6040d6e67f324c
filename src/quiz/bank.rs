//! Built-in question bank.
//!
//! The bank is the primary source for most questions and the fallback
//! whenever a generated question cannot be used.  It is never empty.

use super::question::{QuizQuestion, OPTION_COUNT};
use super::QuizError;

/// `(question, options, correct index, explanation)`
type Entry = (&'static str, [&'static str; OPTION_COUNT], usize, &'static str);

const BUILTIN: &[Entry] = &[
    (
        "Choose the correct sentence:",
        [
            "She don't like coffee.",
            "She doesn't like coffee.",
            "She not like coffee.",
            "She doesn't likes coffee.",
        ],
        1,
        "Third person singular uses \"doesn't\" followed by the base verb.",
    ),
    (
        "Which word best completes the sentence? \"I have lived here ___ 2015.\"",
        ["for", "since", "from", "during"],
        1,
        "\"Since\" marks the starting point of a period that continues now.",
    ),
    (
        "What is the most polite way to ask for help?",
        [
            "Help me.",
            "You need to help me.",
            "Could you help me, please?",
            "Help me now.",
        ],
        2,
        "A modal question with \"please\" softens the request.",
    ),
    (
        "Choose the correct past tense: \"Yesterday, I ___ to the market.\"",
        ["go", "goes", "went", "gone"],
        2,
        "\"Went\" is the simple past of \"go\"; \"gone\" needs an auxiliary.",
    ),
    (
        "Which sentence uses the article correctly?",
        [
            "I saw an unicorn.",
            "She is a honest person.",
            "He bought an umbrella.",
            "They live in a old house.",
        ],
        2,
        "Use \"an\" before a vowel sound: an umbrella.",
    ),
    (
        "In a meeting, which phrase is best for politely disagreeing?",
        [
            "You're wrong.",
            "I see your point, but I think...",
            "That makes no sense.",
            "No way.",
        ],
        1,
        "Acknowledging the other view first keeps the tone collaborative.",
    ),
    (
        "Choose the correct comparative: \"This book is ___ than that one.\"",
        ["more interesting", "interestinger", "most interesting", "more interestinger"],
        0,
        "Long adjectives form the comparative with \"more\".",
    ),
    (
        "Which word is a synonym for \"happy\"?",
        ["sad", "joyful", "angry", "tired"],
        1,
        "\"Joyful\" means full of happiness.",
    ),
    (
        "Pick the correct option: \"If I ___ you, I would apologize.\"",
        ["am", "was", "were", "be"],
        2,
        "The second conditional uses \"were\" for every subject.",
    ),
    (
        "Which is the best way to end a formal email?",
        ["See ya!", "Best regards,", "Bye!!!", "Later,"],
        1,
        "\"Best regards\" is a standard formal sign-off.",
    ),
    (
        "Choose the correct preposition: \"She is good ___ mathematics.\"",
        ["in", "on", "at", "for"],
        2,
        "The fixed expression is \"good at\" something.",
    ),
    (
        "Which sentence is in the present perfect?",
        [
            "I eat breakfast.",
            "I ate breakfast.",
            "I have eaten breakfast.",
            "I will eat breakfast.",
        ],
        2,
        "Present perfect is \"have/has\" plus the past participle.",
    ),
];

/// An ordered, non-empty set of questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<QuizQuestion>,
}

impl QuestionBank {
    /// The questions shipped with the crate.
    pub fn builtin() -> Self {
        let questions = BUILTIN
            .iter()
            .filter_map(|(text, options, correct, explanation)| {
                QuizQuestion::new(*text, *options, *correct)
                    .map(|q| q.with_explanation(*explanation))
                    .ok()
            })
            .collect();
        Self { questions }
    }

    /// A custom bank.  Fails if `questions` is empty.
    pub fn from_questions(questions: Vec<QuizQuestion>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyBank);
        }
        Ok(Self { questions })
    }

    /// The question at `index`, wrapping around the bank.
    pub fn get(&self, index: usize) -> &QuizQuestion {
        &self.questions[index % self.questions.len()]
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn contains(&self, question: &QuizQuestion) -> bool {
        self.questions.contains(question)
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
