//! Error types for Imsoniack

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while ingesting a sample
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid custom_timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl IngestError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Unauthorized => "UNAUTHORIZED",
            IngestError::InvalidInput(_) => "INVALID_INPUT",
            IngestError::InvalidTimestamp(_) => "INVALID_TIMESTAMP",
            IngestError::StorageFailure(_) => "STORAGE_FAILURE",
            IngestError::Config(_) => "CONFIG_ERROR",
            IngestError::Json(_) => "JSON_ERROR",
        }
    }
}
