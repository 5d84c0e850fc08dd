//! Append-only NDJSON file store
//!
//! Each record is written as one JSON line carrying its id.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{RecordStore, StoreError};
use crate::types::{EnrichedRecord, RecordId, StoredRecord};

/// Record store backed by a newline-delimited JSON file
#[derive(Debug)]
pub struct NdjsonStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl NdjsonStore {
    /// Open (or create) the file for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in the file
    pub fn read_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl RecordStore for NdjsonStore {
    fn append(&self, record: &EnrichedRecord) -> Result<RecordId, StoreError> {
        let mut record = record.clone();
        // The line's `id` belongs to the store
        record.extra.remove("id");
        let stored = StoredRecord {
            id: RecordId::generate(),
            record,
        };
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let mut file = self.file.lock().map_err(|_| StoreError::Poisoned)?;
        // One write per record keeps lines whole under concurrent appends
        file.write_all(line.as_bytes())?;
        file.flush()?;

        Ok(stored.id)
    }
}
