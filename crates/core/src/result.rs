//! Aggregate result of one check

use serde::{Deserialize, Serialize};

use crate::offense::Offense;

/// How confident the system is that the sources found the right person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentityConfidence {
    /// Whether any source recognised the identity
    pub matched: bool,
    /// Confidence level, 0-100
    pub level: u8,
}

impl IdentityConfidence {
    pub fn matched(level: u8) -> Self {
        Self {
            matched: true,
            level: level.min(100),
        }
    }

    pub fn unmatched() -> Self {
        Self::default()
    }
}

/// Deduplicated, scored outcome of a probe fan-out.
///
/// Immutable once produced; a fresher computation replaces it in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Risk score, 0-100
    pub risk_score: u8,
    pub identity_confidence: IdentityConfidence,
    /// Deduplicated offense list
    pub offenses: Vec<Offense>,
    /// Sources that returned a finding
    pub sources: Vec<String>,
    /// Generic failure reason, only set when every source failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregateResult {
    /// Result recorded for a check whose sources all failed
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            risk_score: 0,
            identity_confidence: IdentityConfidence::unmatched(),
            offenses: Vec::new(),
            sources: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn has_offenses(&self) -> bool {
        !self.offenses.is_empty()
    }
}
