//! Engine errors

use chrono::{DateTime, Utc};
use guardscreen_core::CoreError;
use guardscreen_ledger::LedgerError;
use thiserror::Error;

/// Errors from the screening engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Insufficient credit (balance {balance})")]
    InsufficientCredit { balance: i64 },

    #[error("Circuit breaker open until {until}")]
    BreakerOpen { until: DateTime<Utc> },

    #[error("All {attempted} sources failed")]
    AllSourcesFailed { attempted: usize },

    #[error("Check not found: {0}")]
    CheckNotFound(String),

    #[error("Check already exists: {0}")]
    CheckExists(String),

    #[error("Unknown cursor: {0}")]
    InvalidCursor(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audit log error: {0}")]
    Audit(String),

    #[error("Pipeline task failed: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl EngineError {
    /// True for the two admission refusals
    pub fn is_admission_refusal(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientCredit { .. } | EngineError::BreakerOpen { .. }
        )
    }
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientCredit { balance } => {
                EngineError::InsufficientCredit { balance }
            }
            LedgerError::BreakerOpen { until } => EngineError::BreakerOpen { until },
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
