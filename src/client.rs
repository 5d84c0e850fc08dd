//! Upload client
//!
//! Posts samples to an ingest endpoint. Batches go through a bounded number of
//! in-flight requests; one failed sample never stops the rest.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;

use crate::config::API_KEY_HEADER;
use crate::types::SensorSample;

/// Errors raised while uploading a sample
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected sample ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Success response carried no docId: {0}")]
    MissingDocId(String),
}

/// Outcome of a batch upload
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub sent: usize,
    pub failed: usize,
    /// Indices of samples that failed, ascending
    pub failed_indices: Vec<usize>,
}

/// Client for an ingest endpoint
pub struct IngestClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl IngestClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload one sample and return the stored document id
    pub async fn send(&self, sample: &SensorSample) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(sample)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let saved: serde_json::Value = resp.json().await?;
        match saved.get("docId").and_then(|id| id.as_str()) {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(ClientError::MissingDocId(saved.to_string())),
        }
    }

    /// Upload a batch with at most `concurrency` requests in flight
    pub async fn send_all(&self, samples: &[SensorSample], concurrency: usize) -> UploadReport {
        let results: Vec<(usize, Result<String, ClientError>)> =
            stream::iter(samples.iter().enumerate())
                .map(|(index, sample)| async move { (index, self.send(sample).await) })
                .buffer_unordered(concurrency.max(1))
                .collect()
                .await;

        let mut report = UploadReport::default();
        for (index, result) in results {
            match result {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    log::error!("Sample {} failed: {}", index, e);
                    report.failed += 1;
                    report.failed_indices.push(index);
                }
            }
        }
        report.failed_indices.sort_unstable();
        report
    }
}
