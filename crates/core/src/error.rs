//! Core errors

use thiserror::Error;

use crate::check::CheckStatus;

/// Errors raised by core domain types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("Fingerprint secret must not be empty")]
    EmptySecret,

    #[error("Illegal transition for check {id}: {from} -> {to}")]
    IllegalTransition {
        id: String,
        from: CheckStatus,
        to: CheckStatus,
    },
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
