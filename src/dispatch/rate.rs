//! Rolling request-rate window.
//!
//! [`RateWindow`] counts transmissions since `window_start`.  The count resets
//! once more than `window` has elapsed; when it reaches `limit` the caller
//! must cool down before transmitting again.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct RateWindow {
    window_start: Instant,
    count: u32,
    limit: u32,
    window: Duration,
}

impl RateWindow {
    /// A zero `limit` is treated as 1 so dispatch can always make progress.
    pub fn new(limit: u32, window: Duration, now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
            limit: limit.max(1),
            window,
        }
    }

    /// Start a fresh window if the current one has expired.
    pub fn roll(&mut self, now: Instant) {
        if now.duration_since(self.window_start) > self.window {
            self.reset(now);
        }
    }

    /// `true` when the ceiling has been reached in the current window.
    pub fn is_exhausted(&self) -> bool {
        self.count >= self.limit
    }

    pub fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.count = 0;
    }

    /// Count one transmission.
    pub fn record(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
