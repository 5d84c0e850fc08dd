//! In-memory record store

use std::sync::{Mutex, PoisonError};

use super::{RecordStore, StoreError};
use crate::types::{EnrichedRecord, RecordId, StoredRecord};

/// Record store kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record, in append order
    pub fn records(&self) -> Vec<StoredRecord> {
        // A push either happened or it did not; the data survives a poisoned lock
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn append(&self, record: &EnrichedRecord) -> Result<RecordId, StoreError> {
        let id = RecordId::generate();
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.push(StoredRecord {
            id: id.clone(),
            record: record.clone(),
        });
        Ok(id)
    }
}
