//! In-memory result cache

use async_trait::async_trait;
use guardscreen_core::{AggregateResult, Clock, Fingerprint, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::entry::CacheEntry;
use crate::types::ResultCache;

/// Process-local cache keyed by fingerprint
pub struct InMemoryCache {
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Entries are stamped with `clock` on write
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(fingerprint)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for InMemoryCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(fingerprint).cloned()
    }

    async fn put(&self, fingerprint: &Fingerprint, result: AggregateResult) {
        let entry = CacheEntry::new(fingerprint.clone(), result, self.clock.now());
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(fingerprint.clone(), entry);
        tracing::debug!(fingerprint = %fingerprint, "Cached aggregate result");
    }
}
