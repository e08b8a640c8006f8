//! Audit sinks - append-only event logs
//!
//! Each JSONL line is one serialized [`AuditEvent`]. Lines are never
//! rewritten.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{EngineError, EngineResult};
use crate::event::AuditEvent;
use crate::store::Page;

/// Destination for audit events
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> EngineResult<()>;

    /// Newest first, starting after the event with id `cursor`
    async fn list(&self, cursor: Option<&str>, limit: usize) -> EngineResult<Page<AuditEvent>>;
}

/// Order `events` newest first and cut one page after `cursor`.
///
/// `events` must be in emission order; events sharing a timestamp keep
/// the later one first.
fn page_newest_first(
    mut events: Vec<AuditEvent>,
    cursor: Option<&str>,
    limit: usize,
) -> EngineResult<Page<AuditEvent>> {
    events.reverse();
    events.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));

    let start = match cursor {
        Some(cursor) => {
            let pos = events
                .iter()
                .position(|e| e.id() == cursor)
                .ok_or_else(|| EngineError::InvalidCursor(cursor.to_string()))?;
            pos + 1
        }
        None => 0,
    };

    let total = events.len();
    let items: Vec<AuditEvent> = events.into_iter().skip(start).take(limit).collect();

    let next_cursor = if start + items.len() < total {
        items.last().map(|e| e.id().to_string())
    } else {
        None
    };

    Ok(Page { items, next_cursor })
}

/// Audit log kept in memory
#[derive(Default)]
pub struct InMemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Events belonging to one check, in emission order
    pub fn events_for(&self, check_id: &str) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.check_id() == Some(check_id))
            .collect()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn record(&self, event: &AuditEvent) -> EngineResult<()> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }

    async fn list(&self, cursor: Option<&str>, limit: usize) -> EngineResult<Page<AuditEvent>> {
        page_newest_first(self.events(), cursor, limit)
    }
}

/// Append-only JSONL file
///
/// File access runs on the blocking pool.
pub struct JsonlAuditLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl JsonlAuditLog {
    /// Open (or create) the log at `path`
    pub fn new(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Read every event back
    pub fn read_all(&self) -> EngineResult<Vec<AuditEvent>> {
        read_events(&self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_events(path: &Path) -> EngineResult<Vec<AuditEvent>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(serde_json::from_str(&line)?);
    }

    Ok(events)
}

fn join_error(err: tokio::task::JoinError) -> EngineError {
    EngineError::Audit(err.to_string())
}

#[async_trait]
impl AuditSink for JsonlAuditLog {
    async fn record(&self, event: &AuditEvent) -> EngineResult<()> {
        let json = serde_json::to_string(event)?;
        let file = Arc::clone(&self.file);

        tokio::task::spawn_blocking(move || -> EngineResult<()> {
            let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
            writeln!(file, "{}", json)?;
            file.flush()?;
            Ok(())
        })
        .await
        .map_err(join_error)?
    }

    async fn list(&self, cursor: Option<&str>, limit: usize) -> EngineResult<Page<AuditEvent>> {
        let path = self.path.clone();
        let events = tokio::task::spawn_blocking(move || read_events(&path))
            .await
            .map_err(join_error)??;

        page_newest_first(events, cursor, limit)
    }
}
