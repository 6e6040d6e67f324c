//! Deterministic source policy (compiled for tests only).

use super::source::{QuestionSource, SourcePolicy};

/// Always the same source; bank indices step through the bank in order.
#[derive(Debug, Clone)]
pub struct FixedPolicy {
    source: QuestionSource,
    next_index: usize,
}

impl FixedPolicy {
    pub fn bank() -> Self {
        Self {
            source: QuestionSource::Bank,
            next_index: 0,
        }
    }

    pub fn generated() -> Self {
        Self {
            source: QuestionSource::Generated,
            next_index: 0,
        }
    }
}

impl SourcePolicy for FixedPolicy {
    fn choose(&mut self) -> QuestionSource {
        self.source
    }

    fn pick_index(&mut self, len: usize) -> usize {
        let index = self.next_index % len.max(1);
        self.next_index = self.next_index.wrapping_add(1);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_bank() {
        let mut policy = FixedPolicy::bank();
        let picks: Vec<usize> = (0..5).map(|_| policy.pick_index(3)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1]);
        assert_eq!(policy.choose(), QuestionSource::Bank);
        assert_eq!(FixedPolicy::generated().choose(), QuestionSource::Generated);
    }
}
