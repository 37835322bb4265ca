//! File-backed store behaviour against real files on disk.

use std::io::Write;

use chrono::{Duration, TimeZone, Utc};
use ci_events::{EventRecord, EventSource, JsonFileStore, MemoryEventStore, Outcome, StoreError};
use tempfile::{NamedTempFile, TempDir};

fn record(id: &str, minutes: i64, outcome: Outcome) -> EventRecord {
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    EventRecord::new(id, outcome, base + Duration::minutes(minutes))
}

fn write_store(records: &[EventRecord]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let body = serde_json::to_string_pretty(records).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

// =========================================================================
// Ordering and limits
// =========================================================================

#[tokio::test]
async fn recent_returns_at_most_limit_newest_first() {
    let records: Vec<_> = (0..6)
        .map(|i| record(&format!("run-{i}"), i * 10, Outcome::Success))
        .collect();
    // Stored out of order on purpose.
    let shuffled = vec![
        records[3].clone(),
        records[0].clone(),
        records[5].clone(),
        records[1].clone(),
        records[4].clone(),
        records[2].clone(),
    ];
    let file = write_store(&shuffled);
    let store = JsonFileStore::new(file.path());

    for limit in 1..=8 {
        let recent = store.recent(limit).await.unwrap();
        assert_eq!(recent.len(), limit.min(6));
        for pair in recent.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    let top = store.recent(2).await.unwrap();
    assert_eq!(top[0].id, "run-5");
    assert_eq!(top[1].id, "run-4");
}

#[tokio::test]
async fn zero_limit_is_invalid() {
    let file = write_store(&[record("run-1", 0, Outcome::Success)]);
    let store = JsonFileStore::new(file.path());
    assert!(matches!(store.recent(0).await, Err(StoreError::InvalidLimit(0))));

    let memory = MemoryEventStore::default();
    assert!(matches!(memory.recent(0).await, Err(StoreError::InvalidLimit(0))));
}

// =========================================================================
// Absent, empty and corrupt stores
// =========================================================================

#[tokio::test]
async fn missing_file_is_empty_not_error() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("events.json"));
    assert!(store.recent(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_file_and_empty_array_are_empty() {
    let empty = NamedTempFile::new().unwrap();
    assert!(JsonFileStore::new(empty.path()).recent(5).await.unwrap().is_empty());

    let array = write_store(&[]);
    assert!(JsonFileStore::new(array.path()).recent(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_file_is_unavailable() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[{\"id\": \"run-1\", \"outcome\": ").unwrap();
    let store = JsonFileStore::new(file.path());

    let err = store.recent(5).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { .. }), "got {err:?}");
}

#[tokio::test]
async fn unknown_outcome_is_unavailable() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"[{"id": "run-1", "outcome": "cancelled", "timestamp": "2026-03-01T12:00:00Z"}]"#,
    )
    .unwrap();
    let err = JsonFileStore::new(file.path()).recent(5).await.unwrap_err();
    assert!(err.to_string().contains("unavailable"), "got {err}");
}

#[tokio::test]
async fn directory_in_place_of_file_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    assert!(matches!(
        store.recent(1).await,
        Err(StoreError::Unavailable { .. })
    ));
}

// =========================================================================
// Memory store
// =========================================================================

#[tokio::test]
async fn memory_store_orders_like_file_store() {
    let records = vec![
        record("old", 0, Outcome::Success),
        record("new", 30, Outcome::Failure),
        record("mid", 15, Outcome::Pending),
    ];
    let file = write_store(&records);

    let from_file = JsonFileStore::new(file.path()).recent(3).await.unwrap();
    let from_memory = MemoryEventStore::new(records).recent(3).await.unwrap();

    assert_eq!(from_file, from_memory);
    assert_eq!(from_memory[0].id, "new");
}
