//! Where the next question comes from.
//!
//! [`SourcePolicy`] is injected into the engine so either branch can be
//! forced.  [`RandomPolicy`] is the production choice: a biased coin for
//! bank vs. generated and a uniform draw within the bank.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Bank,
    Generated,
}

pub trait SourcePolicy: Send {
    /// Decide the source for the next question.
    fn choose(&mut self) -> QuestionSource;

    /// Pick a bank index in `0..len`.  `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;
}

// ---------------------------------------------------------------------------
// RandomPolicy
// ---------------------------------------------------------------------------

pub struct RandomPolicy {
    rng: StdRng,
    generated_probability: f64,
}

impl RandomPolicy {
    pub fn new(generated_probability: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), generated_probability)
    }

    /// Deterministic sequence for a fixed `seed`.
    pub fn seeded(seed: u64, generated_probability: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), generated_probability)
    }

    fn with_rng(rng: StdRng, generated_probability: f64) -> Self {
        let generated_probability = if generated_probability.is_nan() {
            0.0
        } else {
            generated_probability.clamp(0.0, 1.0)
        };
        Self {
            rng,
            generated_probability,
        }
    }
}

impl SourcePolicy for RandomPolicy {
    fn choose(&mut self) -> QuestionSource {
        if self.rng.gen_bool(self.generated_probability) {
            QuestionSource::Generated
        } else {
            QuestionSource::Bank
        }
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }
}
