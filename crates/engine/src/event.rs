//! Audit events emitted over a check's lifetime
//!
//! Events carry ids and fingerprints only, never plaintext identity or
//! secrets.

use chrono::{DateTime, Utc};
use guardscreen_core::{CheckStatus, Fingerprint};
use serde::{Deserialize, Serialize};

/// Events appended to the audit sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum AuditEvent {
    /// A check was admitted and its record created
    #[serde(rename = "check.initiated")]
    CheckInitiated {
        id: String,
        check_id: String,
        fingerprint: Fingerprint,
        timestamp: DateTime<Utc>,
    },

    /// A check reached a terminal status
    #[serde(rename = "check.completed")]
    CheckCompleted {
        id: String,
        check_id: String,
        status: CheckStatus,
        timestamp: DateTime<Utc>,
    },

    /// Operator settings were changed; lists field names, not values
    #[serde(rename = "config.updated")]
    ConfigUpdated {
        id: String,
        changed: Vec<String>,
        timestamp: DateTime<Utc>,
    },
}

impl AuditEvent {
    pub fn check_initiated(
        check_id: impl Into<String>,
        fingerprint: Fingerprint,
        timestamp: DateTime<Utc>,
    ) -> Self {
        AuditEvent::CheckInitiated {
            id: uuid::Uuid::new_v4().to_string(),
            check_id: check_id.into(),
            fingerprint,
            timestamp,
        }
    }

    pub fn check_completed(
        check_id: impl Into<String>,
        status: CheckStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        AuditEvent::CheckCompleted {
            id: uuid::Uuid::new_v4().to_string(),
            check_id: check_id.into(),
            status,
            timestamp,
        }
    }

    pub fn config_updated(changed: Vec<String>, timestamp: DateTime<Utc>) -> Self {
        AuditEvent::ConfigUpdated {
            id: uuid::Uuid::new_v4().to_string(),
            changed,
            timestamp,
        }
    }

    /// Get the event ID
    pub fn id(&self) -> &str {
        match self {
            AuditEvent::CheckInitiated { id, .. } => id,
            AuditEvent::CheckCompleted { id, .. } => id,
            AuditEvent::ConfigUpdated { id, .. } => id,
        }
    }

    /// Get the check this event belongs to, if any
    pub fn check_id(&self) -> Option<&str> {
        match self {
            AuditEvent::CheckInitiated { check_id, .. } => Some(check_id),
            AuditEvent::CheckCompleted { check_id, .. } => Some(check_id),
            AuditEvent::ConfigUpdated { .. } => None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            AuditEvent::CheckInitiated { timestamp, .. } => *timestamp,
            AuditEvent::CheckCompleted { timestamp, .. } => *timestamp,
            AuditEvent::ConfigUpdated { timestamp, .. } => *timestamp,
        }
    }

    /// Wire name, e.g. `check.initiated`
    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::CheckInitiated { .. } => "check.initiated",
            AuditEvent::CheckCompleted { .. } => "check.completed",
            AuditEvent::ConfigUpdated { .. } => "config.updated",
        }
    }
}
