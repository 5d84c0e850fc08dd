//! Ingest service configuration
//!
//! Built once at process start and injected into the server; nothing here is
//! compiled in.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::IngestError;
use crate::store::{MemoryStore, NdjsonStore, RecordStore};

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Runtime configuration for the ingest service
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Shared secret expected in the `x-api-key` header
    pub api_key: String,
    /// Address the HTTP ingress listens on
    pub bind: SocketAddr,
    /// NDJSON file records are appended to; in-memory when absent
    pub store_path: Option<PathBuf>,
}

impl IngestConfig {
    pub fn new(api_key: impl Into<String>, bind: SocketAddr, store_path: Option<PathBuf>) -> Self {
        Self {
            api_key: api_key.into(),
            bind,
            store_path,
        }
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.api_key.trim().is_empty() {
            return Err(IngestError::Config("API key must not be empty".to_string()));
        }
        Ok(())
    }

    /// Open the configured record store
    pub fn open_store(&self) -> Result<Arc<dyn RecordStore>, IngestError> {
        match &self.store_path {
            Some(path) => Ok(Arc::new(NdjsonStore::open(path)?)),
            None => {
                log::warn!("No store path configured, records are kept in memory only");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    /// First characters of the key, for log lines
    pub fn api_key_preview(&self) -> String {
        self.api_key.chars().take(4).collect()
    }
}
