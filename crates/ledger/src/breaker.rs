//! Circuit breaker state machine
//!
//! Closed → Open on the threshold-th failure inside the rolling window.
//! There is no half-open probe: the breaker is closed again as soon as
//! `tripped_until` is in the past. A successful check does not clear
//! the failure count; only time does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BreakerConfig;

/// Failure bookkeeping for the breaker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerState {
    /// Failures counted in the current window
    pub consecutive_failures: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub tripped_until: Option<DateTime<Utc>>,
}

impl BreakerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reopen instant if the breaker is open at `now`
    pub fn open_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.tripped_until.filter(|until| now < *until)
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.open_until(now).is_some()
    }

    /// Record a total failure. Returns true if this failure tripped the breaker.
    pub fn record_failure(&mut self, now: DateTime<Utc>, config: &BreakerConfig) -> bool {
        let within_window = self
            .last_failure_at
            .map(|last| now - last <= config.window())
            .unwrap_or(false);

        self.consecutive_failures = if within_window {
            self.consecutive_failures.saturating_add(1)
        } else {
            1
        };
        self.last_failure_at = Some(now);

        if self.consecutive_failures >= config.failure_threshold {
            self.tripped_until = Some(now + config.open_for());
            true
        } else {
            false
        }
    }
}
