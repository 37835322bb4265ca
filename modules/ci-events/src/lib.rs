//! Captured CI events and the read side of the local event store.
//!
//! Records are written by an external webhook receiver. This crate only reads
//! them: most-recent-first, bounded by a caller-supplied limit.

pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::{latest_by_workflow, validate_limit, EventSource, JsonFileStore, MemoryEventStore};
pub use types::{present, EventRecord, Outcome, SubTask};
