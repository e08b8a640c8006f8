//! Check - the lifecycle record clients poll
//!
//! ```text
//!            ┌──► Hit
//! Pending ───┼──► Clear
//!            └──► Error
//! ```
//!
//! The only legal transition is Pending to one of the terminal states.
//! A terminal check is never modified again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{CoreError, CoreResult};
use crate::fingerprint::Fingerprint;
use crate::identity::Identity;
use crate::result::AggregateResult;

/// Status of a background check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
pub enum CheckStatus {
    Pending,
    Hit,
    Clear,
    Error,
}

impl CheckStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CheckStatus::Pending)
    }

    /// Status implied by an aggregate: Hit iff any offense survived dedup
    pub fn from_result(result: &AggregateResult) -> Self {
        if result.is_failure() {
            CheckStatus::Error
        } else if result.has_offenses() {
            CheckStatus::Hit
        } else {
            CheckStatus::Clear
        }
    }
}

/// A background check record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub id: String,
    pub masked_name: String,
    /// Raw identity, held only until the pipeline takes it
    #[serde(skip)]
    pub identity: Option<Identity>,
    pub fingerprint: Fingerprint,
    pub status: CheckStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AggregateResult>,
}

impl Check {
    /// Create a new Pending check with a fresh id
    pub fn new(identity: Identity, fingerprint: Fingerprint, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            masked_name: identity.masked_name(),
            identity: Some(identity),
            fingerprint,
            status: CheckStatus::Pending,
            created_at,
            completed_at: None,
            result: None,
        }
    }

    /// Remove the raw identity from the record
    pub fn take_identity(&mut self) -> Option<Identity> {
        self.identity.take()
    }

    pub fn is_pending(&self) -> bool {
        self.status == CheckStatus::Pending
    }

    /// Move the check to a terminal state
    pub fn complete(
        &mut self,
        status: CheckStatus,
        result: AggregateResult,
        completed_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        if self.status.is_terminal() || !status.is_terminal() {
            return Err(CoreError::IllegalTransition {
                id: self.id.clone(),
                from: self.status,
                to: status,
            });
        }

        self.status = status;
        self.result = Some(result);
        self.completed_at = Some(completed_at);
        self.identity = None;
        Ok(())
    }
}
