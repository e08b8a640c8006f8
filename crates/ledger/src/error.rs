//! Ledger errors

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Admission-time errors. Neither is retried by the system; the caller
/// must wait for the breaker to close or top up credit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient credit: balance is {balance}")]
    InsufficientCredit { balance: i64 },

    #[error("Circuit breaker open until {until}")]
    BreakerOpen { until: DateTime<Utc> },
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
