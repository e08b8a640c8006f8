//! Cache trait - interface for result storage

use async_trait::async_trait;
use guardscreen_core::{AggregateResult, Fingerprint};

use crate::entry::CacheEntry;

/// Result Cache trait
///
/// Implementations can be:
/// - InMemoryCache: process-local map (tests, CLI)
/// - a durable key-value store behind the same contract
///
/// Writes are last-writer-wins; two checks for the same fingerprint may
/// both compute and both write.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Look up the entry for a fingerprint, fresh or stale
    async fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry>;

    /// Store (or overwrite) the result for a fingerprint
    async fn put(&self, fingerprint: &Fingerprint, result: AggregateResult);
}
