//! Record persistence adapters
//!
//! The pipeline hands every enriched record to a [`RecordStore`]. Appending is
//! the only step of an ingest that may block or fail on its own.

mod memory;
mod ndjson;

pub use memory::MemoryStore;
pub use ndjson::NdjsonStore;

use crate::types::{EnrichedRecord, RecordId};
use thiserror::Error;

/// Errors raised by a record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Store task failed: {0}")]
    Task(String),
}

/// Trait for append-only record stores
pub trait RecordStore: Send + Sync {
    /// Append a record and return the id it was stored under
    fn append(&self, record: &EnrichedRecord) -> Result<RecordId, StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn append(&self, record: &EnrichedRecord) -> Result<RecordId, StoreError> {
        (**self).append(record)
    }
}
