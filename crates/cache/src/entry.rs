//! Cache entry and TTL validity

use chrono::{DateTime, Duration, Utc};
use guardscreen_core::{AggregateResult, Fingerprint};
use serde::{Deserialize, Serialize};

/// Default time-to-live: 24 hours
pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

/// A cached aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub result: AggregateResult,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(fingerprint: Fingerprint, result: AggregateResult, created_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint,
            result,
            created_at,
        }
    }

    /// Age of the entry at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// Valid while younger than `ttl`
    pub fn is_valid(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}
