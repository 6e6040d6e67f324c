//! Single-shot coach features: speech analysis, text correction, word insights.
//!
//! Each feature is one plain-text submission.  Blank input is rejected before
//! anything is queued; a failed submission becomes
//! [`CoachError::Unavailable`], whose `Display` is the apology shown to the
//! learner.

use thiserror::Error;

use crate::dispatch::Dispatcher;
use crate::llm::normalize::FailureReason;
use crate::llm::prompt::PromptBuilder;

// ---------------------------------------------------------------------------
// CoachFeature
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoachFeature {
    SpeechAnalysis,
    TextCorrection,
    WordInsights,
}

impl CoachFeature {
    /// Heading for a successful result.
    pub fn title(&self) -> &'static str {
        match self {
            CoachFeature::SpeechAnalysis => "Speech Analysis",
            CoachFeature::TextCorrection => "Corrected Text",
            CoachFeature::WordInsights => "Vocabulary Insights",
        }
    }

    /// What the learner sees when the request could not be completed.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            CoachFeature::SpeechAnalysis => "Sorry, I couldn't process your speech.",
            CoachFeature::TextCorrection => "Sorry, I couldn't correct the text.",
            CoachFeature::WordInsights => "Sorry, I couldn't find information for that word.",
        }
    }

    fn empty_input_message(&self) -> &'static str {
        match self {
            CoachFeature::SpeechAnalysis => "Please enter some text to practice",
            CoachFeature::TextCorrection => "Please enter some text to correct",
            CoachFeature::WordInsights => "Please enter a word",
        }
    }
}

// ---------------------------------------------------------------------------
// CoachError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoachError {
    /// Nothing to send; no request was queued.
    #[error("{}", .0.empty_input_message())]
    EmptyInput(CoachFeature),

    /// The request settled with a failure marker.
    #[error("{}", .feature.fallback_message())]
    Unavailable {
        feature: CoachFeature,
        reason: FailureReason,
    },
}

// ---------------------------------------------------------------------------
// Coach
// ---------------------------------------------------------------------------

pub struct Coach {
    dispatcher: Dispatcher,
    prompts: PromptBuilder,
}

impl Coach {
    pub fn new(dispatcher: Dispatcher, prompts: PromptBuilder) -> Self {
        Self {
            dispatcher,
            prompts,
        }
    }

    /// Grammar, clarity and tone feedback on a spoken (or typed) passage.
    pub async fn analyze_speech(&self, speech: &str) -> Result<String, CoachError> {
        self.run(CoachFeature::SpeechAnalysis, speech, PromptBuilder::speech_analysis)
            .await
    }

    /// Corrected version of `text` with an explanation of the changes.
    pub async fn correct_text(&self, text: &str) -> Result<String, CoachError> {
        self.run(CoachFeature::TextCorrection, text, PromptBuilder::text_correction)
            .await
    }

    /// Definition, synonyms, antonyms, examples and usage tips for `word`.
    pub async fn explain_word(&self, word: &str) -> Result<String, CoachError> {
        self.run(CoachFeature::WordInsights, word, PromptBuilder::word_insights)
            .await
    }

    async fn run(
        &self,
        feature: CoachFeature,
        input: &str,
        build: fn(&PromptBuilder, &str) -> String,
    ) -> Result<String, CoachError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CoachError::EmptyInput(feature));
        }

        let prompt = build(&self.prompts, input);
        let text = self
            .dispatcher
            .submit(prompt, false)
            .await
            .into_text()
            .map_err(|reason| CoachError::Unavailable { feature, reason })?;

        if text.trim().is_empty() {
            return Err(CoachError::Unavailable {
                feature,
                reason: FailureReason::Upstream("empty response".into()),
            });
        }

        log::debug!("coach: {} complete ({} chars)", feature.title(), text.len());
        Ok(text)
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

    fn coach_with(gateway: &Arc<ScriptedGateway>) -> Coach {
        let gw: Arc<dyn Gateway> = Arc::clone(gateway) as Arc<dyn Gateway>;
        Coach::new(
            Dispatcher::spawn(gw, &DispatcherConfig::default()),
            PromptBuilder::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn correct_text_returns_model_text() {
        let gateway = Arc::new(ScriptedGateway::with_script([Ok(GatewayReply::text(
            "They're going to the park tomorrow.",
        ))]));
        let coach = coach_with(&gateway);

        let text = coach.correct_text("  their going to the park tomorow ").await;
        assert_eq!(text.as_deref(), Ok("They're going to the park tomorrow."));

        let prompts = gateway.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"their going to the park tomorow\""));
        assert!(!gateway.requests()[0].is_json);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_is_rejected_without_a_call() {
        let gateway = Arc::new(ScriptedGateway::new());
        let coach = coach_with(&gateway);

        let err = coach.explain_word("   ").await.unwrap_err();
        assert_eq!(err, CoachError::EmptyInput(CoachFeature::WordInsights));
        assert_eq!(err.to_string(), "Please enter a word");
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_maps_to_fallback_message() {
        let gateway = Arc::new(ScriptedGateway::with_script([Err(GatewayError::Status {
            code: 500,
            message: "Server error".into(),
        })]));
        let coach = coach_with(&gateway);

        let err = coach.analyze_speech("I am agree with you").await.unwrap_err();
        assert_eq!(err.to_string(), "Sorry, I couldn't process your speech.");
        assert!(matches!(
            err,
            CoachError::Unavailable {
                feature: CoachFeature::SpeechAnalysis,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn blank_model_output_is_treated_as_failure() {
        let gateway = Arc::new(ScriptedGateway::with_script([Ok(GatewayReply::text("  "))]));
        let coach = coach_with(&gateway);

        let err = coach.explain_word("serendipity").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sorry, I couldn't find information for that word."
        );
    }
}
