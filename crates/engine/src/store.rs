//! Check records - keyed storage with newest-first paging
//!
//! The engine is the only writer of a check's status and result.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guardscreen_core::Check;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Paging request for `list`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    /// Id of the last check on the previous page
    #[serde(default)]
    pub cursor: Option<String>,
    /// Requested page size; 0 means the configured default
    #[serde(default)]
    pub limit: usize,
}

impl ListRequest {
    pub fn new(limit: usize) -> Self {
        Self {
            cursor: None,
            limit,
        }
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Page size clamped to `1..=list_max_limit`
    pub fn effective_limit(&self, config: &EngineConfig) -> usize {
        let max = config.list_max_limit.max(1);
        if self.limit == 0 {
            config.list_default_limit.clamp(1, max)
        } else {
            self.limit.clamp(1, max)
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page, absent on the last one
    pub next_cursor: Option<String>,
}

/// Durable storage for check records
#[async_trait]
pub trait CheckStore: Send + Sync {
    async fn insert(&self, check: Check) -> EngineResult<()>;

    async fn get(&self, id: &str) -> EngineResult<Option<Check>>;

    /// Replace an existing record
    async fn update(&self, check: Check) -> EngineResult<()>;

    /// Newest first, starting after `cursor`
    async fn list(&self, cursor: Option<&str>, limit: usize) -> EngineResult<Page<Check>>;

    /// Remove terminal checks created before `cutoff`. Returns the count removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> EngineResult<usize>;
}

/// Process-local check store
#[derive(Default)]
pub struct InMemoryCheckStore {
    checks: RwLock<HashMap<String, Check>>,
}

impl InMemoryCheckStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.checks.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CheckStore for InMemoryCheckStore {
    async fn insert(&self, check: Check) -> EngineResult<()> {
        let mut checks = self.checks.write().unwrap_or_else(|e| e.into_inner());
        if checks.contains_key(&check.id) {
            return Err(EngineError::CheckExists(check.id));
        }
        checks.insert(check.id.clone(), check);
        Ok(())
    }

    async fn get(&self, id: &str) -> EngineResult<Option<Check>> {
        let checks = self.checks.read().unwrap_or_else(|e| e.into_inner());
        Ok(checks.get(id).cloned())
    }

    async fn update(&self, check: Check) -> EngineResult<()> {
        let mut checks = self.checks.write().unwrap_or_else(|e| e.into_inner());
        match checks.get_mut(&check.id) {
            Some(slot) => {
                *slot = check;
                Ok(())
            }
            None => Err(EngineError::CheckNotFound(check.id)),
        }
    }

    async fn list(&self, cursor: Option<&str>, limit: usize) -> EngineResult<Page<Check>> {
        let checks = self.checks.read().unwrap_or_else(|e| e.into_inner());

        let mut ordered: Vec<&Check> = checks.values().collect();
        // Ties on created_at are broken by id so paging is stable
        ordered.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let start = match cursor {
            Some(cursor) => {
                let pos = ordered
                    .iter()
                    .position(|c| c.id == cursor)
                    .ok_or_else(|| EngineError::InvalidCursor(cursor.to_string()))?;
                pos + 1
            }
            None => 0,
        };

        let items: Vec<Check> = ordered
            .iter()
            .skip(start)
            .take(limit)
            .map(|c| (*c).clone())
            .collect();

        let next_cursor = if start + items.len() < ordered.len() {
            items.last().map(|c| c.id.clone())
        } else {
            None
        };

        Ok(Page { items, next_cursor })
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> EngineResult<usize> {
        let mut checks = self.checks.write().unwrap_or_else(|e| e.into_inner());
        let before = checks.len();
        checks.retain(|_, c| c.is_pending() || c.created_at >= cutoff);
        Ok(before - checks.len())
    }
}
