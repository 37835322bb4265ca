//! Read side of the captured-event store.
//!
//! The capture process appends records; we only ever read them back, newest
//! first. A missing or empty store is a normal state (nothing captured yet).
//! A store that exists but cannot be parsed is an error and is never hidden.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::types::{present, EventRecord};

/// Anything that can hand back the most recent captured events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Up to `limit` records ordered by timestamp, newest first.
    /// `limit == 0` is rejected.
    async fn recent(&self, limit: usize) -> Result<Vec<EventRecord>>;
}

/// Convert a caller-supplied limit into a usable bound.
pub fn validate_limit(limit: i64) -> Result<usize> {
    if limit <= 0 {
        return Err(StoreError::InvalidLimit(limit));
    }
    usize::try_from(limit).map_err(|_| StoreError::InvalidLimit(limit))
}

/// Sort newest first and truncate. Records sharing a timestamp keep the
/// later-appended one in front.
fn most_recent_first(mut records: Vec<EventRecord>, limit: usize) -> Vec<EventRecord> {
    records.reverse();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(limit);
    records
}

/// Newest record per workflow name, newest first. Records without a workflow
/// name are skipped.
pub fn latest_by_workflow(records: &[EventRecord]) -> Vec<EventRecord> {
    let ordered = most_recent_first(records.to_vec(), records.len());
    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter(|r| match present(&r.workflow) {
            Some(name) => seen.insert(name.to_string()),
            None => false,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// The capture process's file: either one JSON array or JSON Lines.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in the file, in stored order.
    pub async fn load_all(&self) -> Result<Vec<EventRecord>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Event store not found, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::unavailable(&self.path, e)),
        };

        let records =
            parse_records(&raw).map_err(|reason| StoreError::unavailable(&self.path, reason))?;
        debug!(path = %self.path.display(), count = records.len(), "Loaded event store");
        Ok(records)
    }
}

#[async_trait]
impl EventSource for JsonFileStore {
    async fn recent(&self, limit: usize) -> Result<Vec<EventRecord>> {
        if limit == 0 {
            return Err(StoreError::InvalidLimit(0));
        }
        let records = self.load_all().await?;
        Ok(most_recent_first(records, limit))
    }
}

fn parse_records(raw: &str) -> std::result::Result<Vec<EventRecord>, String> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| format!("invalid JSON array: {e}"));
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| format!("invalid record on line {}: {e}", idx + 1))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// MemoryEventStore
// ---------------------------------------------------------------------------

/// Fixed in-memory sequence of records, in append order.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    records: Vec<EventRecord>,
}

impl MemoryEventStore {
    pub fn new(records: Vec<EventRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }
}

#[async_trait]
impl EventSource for MemoryEventStore {
    async fn recent(&self, limit: usize) -> Result<Vec<EventRecord>> {
        if limit == 0 {
            return Err(StoreError::InvalidLimit(0));
        }
        Ok(most_recent_first(self.records.clone(), limit))
    }
}
