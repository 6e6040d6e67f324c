//! Quiz state machine.
//!
//! ```text
//! next_question ──▶ awaiting answer ──submit_answer──▶ revealed (locked)
//!       ▲                                                  │
//!       └────────────── advance (reveal delay) ◀───────────┘
//! ```
//!
//! There is no terminal state; the loop runs until the caller stops asking.

use std::time::Duration;

use crate::config::QuizConfig;
use crate::dispatch::Dispatcher;
use crate::llm::PromptBuilder;

use super::bank::QuestionBank;
use super::question::{GeneratedQuestion, QuizQuestion, OPTION_COUNT};
use super::source::{QuestionSource, RandomPolicy, SourcePolicy};
use super::QuizError;

// ---------------------------------------------------------------------------
// QuizSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizSession {
    /// Correct answers so far.  Never decreases within a session.
    pub score: u32,
    pub current: Option<QuizQuestion>,
    /// `true` once the current question has been answered.
    pub answered: bool,
}

/// Result of one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_index: usize,
    /// Score after this answer.
    pub score: u32,
    pub explanation: Option<String>,
}

// ---------------------------------------------------------------------------
// QuizEngine
// ---------------------------------------------------------------------------

pub struct QuizEngine {
    dispatcher: Dispatcher,
    prompts: PromptBuilder,
    bank: QuestionBank,
    policy: Box<dyn SourcePolicy>,
    reveal_delay: Duration,
    session: QuizSession,
}

impl QuizEngine {
    pub fn new(
        dispatcher: Dispatcher,
        prompts: PromptBuilder,
        bank: QuestionBank,
        policy: Box<dyn SourcePolicy>,
        reveal_delay: Duration,
    ) -> Self {
        Self {
            dispatcher,
            prompts,
            bank,
            policy,
            reveal_delay,
            session: QuizSession::default(),
        }
    }

    /// Built-in bank with a random source policy.
    pub fn from_config(dispatcher: Dispatcher, prompts: PromptBuilder, config: &QuizConfig) -> Self {
        Self::new(
            dispatcher,
            prompts,
            QuestionBank::builtin(),
            Box::new(RandomPolicy::new(config.generated_probability)),
            config.reveal_delay(),
        )
    }

    /// Load and return the next question.
    ///
    /// Never fails: a generated question that cannot be used is replaced
    /// by a bank question.
    pub async fn next_question(&mut self) -> QuizQuestion {
        let question = match self.policy.choose() {
            QuestionSource::Generated => match self.generate().await {
                Ok(question) => {
                    log::debug!("quiz: using generated question");
                    question
                }
                Err(e) => {
                    log::warn!("quiz: generated question unusable ({e}); using bank");
                    self.from_bank()
                }
            },
            QuestionSource::Bank => self.from_bank(),
        };

        self.session.current = Some(question.clone());
        self.session.answered = false;
        question
    }

    /// Grade `index` for the current question and lock it.
    pub fn submit_answer(&mut self, index: usize) -> Result<AnswerOutcome, QuizError> {
        let question = self.session.current.as_ref().ok_or(QuizError::NoQuestion)?;
        if self.session.answered {
            return Err(QuizError::AlreadyAnswered);
        }
        if index >= OPTION_COUNT {
            return Err(QuizError::OutOfRange(index));
        }

        let correct = question.is_correct(index);
        let correct_index = question.correct_index();
        let explanation = question.explanation().map(str::to_string);

        if correct {
            self.session.score += 1;
        }
        self.session.answered = true;
        log::debug!(
            "quiz: answer {index} ({}) score={}",
            if correct { "correct" } else { "wrong" },
            self.session.score
        );

        Ok(AnswerOutcome {
            correct,
            correct_index,
            score: self.session.score,
            explanation,
        })
    }

    /// Wait out the reveal delay if the current question was answered,
    /// then load the next one.
    pub async fn advance(&mut self) -> QuizQuestion {
        if self.session.answered {
            tokio::time::sleep(self.reveal_delay).await;
        }
        self.next_question().await
    }

    /// Back to a fresh session: zero score, no current question.
    pub fn restart(&mut self) {
        self.session = QuizSession::default();
        log::info!("quiz: restarted");
    }

    pub fn score(&self) -> u32 {
        self.session.score
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn reveal_delay(&self) -> Duration {
        self.reveal_delay
    }

    // -----------------------------------------------------------------------
    // Sources
    // -----------------------------------------------------------------------

    async fn generate(&self) -> Result<QuizQuestion, QuizError> {
        let value = self
            .dispatcher
            .submit(self.prompts.quiz_question(), true)
            .await
            .into_structured()
            .map_err(QuizError::Generation)?;
        GeneratedQuestion::from_value(value)?.try_into()
    }

    fn from_bank(&mut self) -> QuizQuestion {
        let index = self.policy.pick_index(self.bank.len());
        self.bank.get(index).clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::DispatcherConfig;
    use crate::gateway::mock::ScriptedGateway;
    use crate::gateway::{Gateway, GatewayError, GatewayReply};
    use crate::quiz::mock::FixedPolicy;

    fn engine_with(gateway: Arc<ScriptedGateway>, policy: FixedPolicy) -> QuizEngine {
        let gw: Arc<dyn Gateway> = gateway;
        QuizEngine::new(
            Dispatcher::spawn(gw, &DispatcherConfig::default()),
            PromptBuilder::default(),
            QuestionBank::builtin(),
            Box::new(policy),
            Duration::from_millis(2500),
        )
    }

    fn bank_engine() -> QuizEngine {
        engine_with(Arc::new(ScriptedGateway::new()), FixedPolicy::bank())
    }

    #[tokio::test]
    async fn only_the_correct_index_scores() {
        let bank = QuestionBank::from_questions(vec![QuizQuestion::new(
            "Q",
            ["a", "b", "c", "d"],
            2,
        )
        .unwrap()])
        .unwrap();
        let gw: Arc<dyn Gateway> = Arc::new(ScriptedGateway::new());
        let mut engine = QuizEngine::new(
            Dispatcher::spawn(gw, &DispatcherConfig::default()),
            PromptBuilder::default(),
            bank,
            Box::new(FixedPolicy::bank()),
            Duration::ZERO,
        );

        for index in 0..OPTION_COUNT {
            engine.next_question().await;
            let outcome = engine.submit_answer(index).unwrap();
            assert_eq!(outcome.correct, index == 2, "index {index}");
            assert_eq!(outcome.correct_index, 2);
        }
        assert_eq!(engine.score(), 1);
    }

    #[tokio::test]
    async fn ten_correct_answers_score_ten() {
        let mut engine = bank_engine();
        for expected in 1..=10 {
            let q = engine.next_question().await;
            let outcome = engine.submit_answer(q.correct_index()).unwrap();
            assert!(outcome.correct);
            assert_eq!(outcome.score, expected);
        }
        assert_eq!(engine.score(), 10);
    }

    #[tokio::test]
    async fn wrong_answers_never_change_the_score() {
        let mut engine = bank_engine();
        let q = engine.next_question().await;
        engine.submit_answer(q.correct_index()).unwrap();

        for _ in 0..5 {
            let q = engine.next_question().await;
            let wrong = (q.correct_index() + 1) % OPTION_COUNT;
            let outcome = engine.submit_answer(wrong).unwrap();
            assert!(!outcome.correct);
            assert_eq!(outcome.score, 1);
            assert!(outcome.explanation.is_some());
        }
    }

    #[tokio::test]
    async fn answered_question_is_locked() {
        let mut engine = bank_engine();
        let q = engine.next_question().await;
        let wrong = (q.correct_index() + 1) % OPTION_COUNT;
        engine.submit_answer(wrong).unwrap();

        assert_eq!(
            engine.submit_answer(q.correct_index()),
            Err(QuizError::AlreadyAnswered)
        );
        assert_eq!(engine.score(), 0);
    }

    #[tokio::test]
    async fn answer_without_question_or_out_of_range() {
        let mut engine = bank_engine();
        assert_eq!(engine.submit_answer(0), Err(QuizError::NoQuestion));

        engine.next_question().await;
        assert_eq!(engine.submit_answer(4), Err(QuizError::OutOfRange(4)));
        // A bad index does not lock the question.
        assert!(engine.submit_answer(0).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn three_option_generation_falls_back_to_bank() {
        let gateway = Arc::new(ScriptedGateway::with_script([Ok(GatewayReply::text(
            r#"{"question":"Q","options":["a","b","c"],"correctAnswerIndex":1}"#,
        ))]));
        let mut engine = engine_with(Arc::clone(&gateway), FixedPolicy::generated());

        let q = engine.next_question().await;
        assert!(QuestionBank::builtin().contains(&q));
        assert_eq!(gateway.call_count(), 1);
        assert!(gateway.requests()[0].is_json);
    }

    #[tokio::test(start_paused = true)]
    async fn gateway_failure_falls_back_to_bank() {
        let gateway = Arc::new(ScriptedGateway::with_script([Err(GatewayError::Status {
            code: 500,
            message: "boom".into(),
        })]));
        let mut engine = engine_with(Arc::clone(&gateway), FixedPolicy::generated());

        let q = engine.next_question().await;
        assert!(QuestionBank::builtin().contains(&q));
        assert!(engine.session().current.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn valid_generated_question_is_used() {
        let gateway = Arc::new(ScriptedGateway::with_script([Ok(GatewayReply::text(
            "```json\n{\"question\":\"Pick the plural of 'child'\",\
             \"options\":[\"childs\",\"children\",\"childes\",\"childen\"],\
             \"correctAnswerIndex\":1,\"explanation\":\"Irregular plural.\"}\n```",
        ))]));
        let mut engine = engine_with(gateway, FixedPolicy::generated());

        let q = engine.next_question().await;
        assert_eq!(q.text(), "Pick the plural of 'child'");
        let outcome = engine.submit_answer(1).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.explanation.as_deref(), Some("Irregular plural."));
    }

    #[tokio::test(start_paused = true)]
    async fn advance_waits_for_reveal_after_answer() {
        let mut engine = bank_engine();
        let q = engine.next_question().await;
        engine.submit_answer(q.correct_index()).unwrap();

        let started = tokio::time::Instant::now();
        engine.advance().await;
        assert!(started.elapsed() >= Duration::from_millis(2500));
        assert!(!engine.session().answered);
    }

    #[tokio::test(start_paused = true)]
    async fn advance_without_answer_is_immediate() {
        let mut engine = bank_engine();
        engine.next_question().await;

        let started = tokio::time::Instant::now();
        engine.advance().await;
        assert!(started.elapsed() < Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn restart_resets_session() {
        let mut engine = bank_engine();
        let q = engine.next_question().await;
        engine.submit_answer(q.correct_index()).unwrap();

        engine.restart();
        assert_eq!(engine.session(), &QuizSession::default());
        assert_eq!(engine.score(), 0);
    }
}
