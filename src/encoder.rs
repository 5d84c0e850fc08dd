//! Record encoding
//!
//! This module assembles the enriched record handed to storage: the sample's
//! passthrough fields, the filtered readings, the scores and the effective
//! timestamp. The caller's `custom_timestamp` is consumed, never stored.
//! Computed fields always win over passthrough keys of the same name.

use crate::error::IngestError;
use crate::schema::resolve_timestamp;
use crate::types::{EnrichedRecord, SampleAssessment, SensorSample};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Keys written by the pipeline or the store; never taken from the caller
pub const RESERVED_FIELDS: &[&str] = &["sleep_score", "sleep_stage", "server_timestamp", "id"];

/// Encoder for producing enriched records
pub struct RecordEncoder;

impl RecordEncoder {
    /// Build the record; `received_at` stamps samples without a custom timestamp
    pub fn encode(
        sample: &SensorSample,
        assessment: &SampleAssessment,
        received_at: DateTime<Utc>,
    ) -> Result<EnrichedRecord, IngestError> {
        let server_timestamp =
            resolve_timestamp(sample.custom_timestamp.as_deref())?.unwrap_or(received_at);

        Ok(EnrichedRecord {
            accel: sample.accel,
            heart_rate: assessment.readings.heart_rate,
            spo2: assessment.readings.spo2,
            temperature: sample.temperature,
            sleep_score: assessment.sleep_score,
            sleep_stage: assessment.sleep_stage,
            server_timestamp,
            extra: passthrough_fields(&sample.extra),
        })
    }

    /// Encode to a JSON string
    pub fn encode_to_json(
        sample: &SensorSample,
        assessment: &SampleAssessment,
        received_at: DateTime<Utc>,
    ) -> Result<String, IngestError> {
        let record = Self::encode(sample, assessment, received_at)?;
        serde_json::to_string(&record).map_err(IngestError::Json)
    }
}

fn passthrough_fields(extra: &Map<String, Value>) -> Map<String, Value> {
    let mut fields = extra.clone();
    for key in RESERVED_FIELDS {
        if fields.remove(*key).is_some() {
            log::debug!("Dropped caller-supplied '{}'", key);
        }
    }
    fields
}
