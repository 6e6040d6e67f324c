//! Linear-backoff retry policy for transient gateway failures.
//!
//! Retry `k` (1-based) waits `base_delay * k`.  With the defaults
//! (`max_retries = 3`, `base_delay = 1 s`) one request is transmitted at most
//! four times, pausing 1 s, 2 s and 3 s in between.

use std::time::Duration;

use crate::config::DispatcherConfig;
use crate::gateway::GatewayError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &DispatcherConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }

    /// Whether `err` warrants another attempt after `retries_done` retries.
    pub fn should_retry(&self, err: &GatewayError, retries_done: u32) -> bool {
        err.is_transient() && retries_done < self.max_retries
    }

    /// The full backoff schedule, one delay per permitted retry.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_retries).map(|retry| self.delay_for(retry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_linear() {
        let policy = RetryPolicy::default();
        let schedule: Vec<Duration> = policy.schedule().collect();
        assert_eq!(
            schedule,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(3)
            ]
        );
    }

    #[test]
    fn retries_stop_at_max() {
        let policy = RetryPolicy::default();
        let err = GatewayError::RateLimited;
        assert!(policy.should_retry(&err, 0));
        assert!(policy.should_retry(&err, 2));
        assert!(!policy.should_retry(&err, 3));
    }

    #[test]
    fn terminal_errors_are_never_retried() {
        let policy = RetryPolicy::default();
        let err = GatewayError::Status {
            code: 500,
            message: "boom".into(),
        };
        assert!(!policy.should_retry(&err, 0));
        assert!(!policy.should_retry(&GatewayError::MissingCredential, 0));
    }

    #[test]
    fn from_config_uses_configured_values() {
        let config = DispatcherConfig {
            max_retries: 5,
            base_delay_ms: 250,
            ..DispatcherConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.delay_for(4), Duration::from_millis(1_000));
    }
}
