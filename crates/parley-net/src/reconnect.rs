//! Reconnection policy state machine.
//!
//! Pure state: no timers, no I/O. The hub event loop asks for a decision
//! after every failed connect attempt and executes the returned delay
//! itself, which keeps the policy directly testable.

use std::time::Duration;

use parley_shared::constants::{MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAYS_SECS};

/// Decision returned after a failed connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then attempt to reconnect.
    Retry(Duration),
    /// Retry budget exhausted; transition to `Failed` and stop.
    GiveUp,
}

/// Tracks reconnect attempts and computes backoff delays from a fixed
/// table, capping at the table's last entry and giving up past the
/// maximum attempt count.
#[derive(Debug, Clone)]
pub struct ReconnectController {
    delays: Vec<Duration>,
    max_attempts: u32,
    attempts: u32,
}

impl ReconnectController {
    /// Controller with the default backoff table and retry budget.
    pub fn new() -> Self {
        Self::with_policy(
            RECONNECT_DELAYS_SECS
                .iter()
                .map(|&s| Duration::from_secs(s))
                .collect(),
            MAX_RECONNECT_ATTEMPTS,
        )
    }

    /// Controller with a custom backoff table and retry budget.
    pub fn with_policy(delays: Vec<Duration>, max_attempts: u32) -> Self {
        Self {
            delays,
            max_attempts,
            attempts: 0,
        }
    }

    /// Record a failed attempt and decide what to do next.
    pub fn next_attempt(&mut self) -> RetryDecision {
        self.attempts += 1;
        if self.attempts > self.max_attempts || self.delays.is_empty() {
            return RetryDecision::GiveUp;
        }

        let index = (self.attempts as usize - 1).min(self.delays.len() - 1);
        RetryDecision::Retry(self.delays[index])
    }

    /// Reset the attempt counter, granting a fresh retry budget. Called
    /// after a successful connect and on every explicit connect command.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Number of failed attempts since the last successful connect.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Default for ReconnectController {
    fn default() -> Self {
        Self::new()
    }
}
