//! Credit ledger - the shared admission singleton

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use guardscreen_core::{Clock, SystemClock};
use serde::{Deserialize, Serialize};

use crate::breaker::BreakerState;
use crate::config::BreakerConfig;
use crate::error::{LedgerError, LedgerResult};

/// Granted admission: one credit has been consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// Balance left after this reservation
    pub remaining: i64,
}

/// Read-only view of the ledger for dashboards and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub balance: i64,
    pub consecutive_failures: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub tripped_until: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct LedgerState {
    balance: i64,
    breaker: BreakerState,
}

/// Credit balance plus circuit breaker.
///
/// State is private and only reachable through `try_reserve`,
/// `record_failure` and `top_up`, each of which holds the lock for
/// the whole read-modify-write.
pub struct CreditLedger {
    state: Mutex<LedgerState>,
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
}

impl CreditLedger {
    /// Create a ledger with the given starting balance
    pub fn new(balance: i64, config: BreakerConfig) -> Self {
        Self::with_clock(balance, config, Arc::new(SystemClock))
    }

    /// Create a ledger driven by a custom clock
    pub fn with_clock(balance: i64, config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                balance,
                breaker: BreakerState::new(),
            }),
            config,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // A panic while holding the lock cannot leave the two fields
        // inconsistent with each other, so poisoning is ignored.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check the breaker and balance, and consume one credit
    pub fn try_reserve(&self) -> LedgerResult<Reservation> {
        let now = self.clock.now();
        let mut state = self.lock();

        if let Some(until) = state.breaker.open_until(now) {
            tracing::warn!(until = %until, "Admission refused: circuit breaker open");
            return Err(LedgerError::BreakerOpen { until });
        }

        if state.balance <= 0 {
            tracing::warn!(balance = state.balance, "Admission refused: insufficient credit");
            return Err(LedgerError::InsufficientCredit {
                balance: state.balance,
            });
        }

        state.balance -= 1;
        tracing::debug!(remaining = state.balance, "Credit reserved");

        Ok(Reservation {
            remaining: state.balance,
        })
    }

    /// Record a total upstream failure. Returns true if the breaker tripped.
    pub fn record_failure(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();
        let tripped = state.breaker.record_failure(now, &self.config);

        if tripped {
            tracing::error!(
                failures = state.breaker.consecutive_failures,
                until = ?state.breaker.tripped_until,
                "Circuit breaker tripped"
            );
        } else {
            tracing::warn!(
                failures = state.breaker.consecutive_failures,
                "Upstream failure recorded"
            );
        }
        tripped
    }

    /// Add credit. Returns the new balance.
    pub fn top_up(&self, credits: u32) -> i64 {
        let mut state = self.lock();
        state.balance = state.balance.saturating_add(i64::from(credits));
        tracing::info!(credits, balance = state.balance, "Credit topped up");
        state.balance
    }

    pub fn balance(&self) -> i64 {
        self.lock().balance
    }

    pub fn is_open(&self) -> bool {
        let now = self.clock.now();
        self.lock().breaker.is_open(now)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.lock();
        LedgerSnapshot {
            balance: state.balance,
            consecutive_failures: state.breaker.consecutive_failures,
            last_failure_at: state.breaker.last_failure_at,
            tripped_until: state.breaker.tripped_until,
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }
}
