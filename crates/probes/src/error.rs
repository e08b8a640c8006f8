//! Probe error types

use thiserror::Error;

/// A single source failed to answer.
///
/// Recovered locally by the aggregator: the source simply contributes no
/// findings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Source reachable but returned an error, or not reachable at all
    #[error("Source {probe} unavailable: {reason}")]
    Unavailable { probe: String, reason: String },

    /// Source did not answer within the per-probe timeout
    #[error("Source {probe} timed out after {timeout_ms}ms")]
    Timeout { probe: String, timeout_ms: u64 },

    /// Probe task panicked or was aborted
    #[error("Source {probe} task failed: {reason}")]
    TaskFailed { probe: String, reason: String },
}

impl ProbeError {
    pub fn unavailable(probe: impl Into<String>, reason: impl Into<String>) -> Self {
        ProbeError::Unavailable {
            probe: probe.into(),
            reason: reason.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout { .. })
    }
}

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;
