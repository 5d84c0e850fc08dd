//! Pipeline orchestration
//!
//! This module provides the public API for Imsoniack.
//! It runs one sample through every stage and hands the result to storage.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::encoder::RecordEncoder;
use crate::error::IngestError;
use crate::filter::SignalFilter;
use crate::motion::MotionAnalyzer;
use crate::schema::{resolve_timestamp, Validator};
use crate::scoring::{HeartRateScorer, SleepScoreCombiner};
use crate::stage::StageClassifier;
use crate::store::RecordStore;
use crate::types::{EnrichedRecord, RecordId, SampleAssessment, SensorSample};

/// Score a single sample.
///
/// Pipeline stages:
/// 1. MotionAnalyzer - Movement (stillness) score
/// 2. SignalFilter - Noise suppression and range rejection
/// 3. HeartRateScorer - Resting heart-rate score
/// 4. SleepScoreCombiner - Weighted sleep score
/// 5. StageClassifier - Sleep stage label
pub fn assess_sample(sample: &SensorSample) -> SampleAssessment {
    let movement_score = MotionAnalyzer::movement_score(sample.accel.as_ref());
    let readings = SignalFilter::filter(sample);
    let hr_score = HeartRateScorer::score(readings.heart_rate);
    let sleep_score = SleepScoreCombiner::combine(movement_score, hr_score);
    let sleep_stage = StageClassifier::classify(movement_score, readings.heart_rate);

    SampleAssessment {
        movement_score,
        hr_score,
        sleep_score,
        sleep_stage,
        readings,
    }
}

/// Validate and score a request body into an enriched record.
///
/// Fails with `InvalidInput` or `InvalidTimestamp` before anything is stored.
pub fn enrich(
    body: Option<&Value>,
    received_at: DateTime<Utc>,
) -> Result<EnrichedRecord, IngestError> {
    let sample = Validator::validate(body)?;
    enrich_sample(&sample, received_at)
}

/// Score an already validated sample into an enriched record
pub fn enrich_sample(
    sample: &SensorSample,
    received_at: DateTime<Utc>,
) -> Result<EnrichedRecord, IngestError> {
    // Reject a bad timestamp before spending work on scoring
    resolve_timestamp(sample.custom_timestamp.as_deref())?;

    let assessment = assess_sample(sample);
    if !assessment.readings.flags.is_empty() {
        log::debug!("Filter discarded readings: {:?}", assessment.readings.flags);
    }

    RecordEncoder::encode(sample, &assessment, received_at)
}

/// Convert one raw JSON sample into an enriched record JSON, stamped now.
///
/// # Example
/// ```ignore
/// let record_json = sample_to_record(r#"{"heart_rate": 70}"#.to_string())?;
/// ```
pub fn sample_to_record(raw_json: String) -> Result<String, IngestError> {
    let sample = Validator::validate_bytes(raw_json.as_bytes())?;
    let record = enrich_sample(&sample, Utc::now())?;
    serde_json::to_string(&record).map_err(IngestError::Json)
}

/// Result of a successful ingest
#[derive(Debug, Clone)]
pub struct Ingested {
    pub id: RecordId,
    pub record: EnrichedRecord,
}

/// Processor that scores samples and appends them to a record store.
///
/// Holds no per-sample state; one processor can serve concurrent callers.
pub struct SleepProcessor {
    store: Arc<dyn RecordStore>,
}

impl SleepProcessor {
    /// Create a processor writing to the given store
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Ingest a body, stamping it with the current time
    pub fn ingest(&self, body: Option<&Value>) -> Result<Ingested, IngestError> {
        self.ingest_at(body, Utc::now())
    }

    /// Ingest a body with an explicit receive time
    pub fn ingest_at(
        &self,
        body: Option<&Value>,
        received_at: DateTime<Utc>,
    ) -> Result<Ingested, IngestError> {
        let record = enrich(body, received_at)?;
        self.persist(record)
    }

    /// Ingest raw body bytes; an empty body counts as absent
    pub fn ingest_bytes(&self, bytes: &[u8]) -> Result<Ingested, IngestError> {
        let sample = Validator::validate_bytes(bytes)?;
        let record = enrich_sample(&sample, Utc::now())?;
        self.persist(record)
    }

    /// Append an already enriched record to the store
    pub fn persist(&self, record: EnrichedRecord) -> Result<Ingested, IngestError> {
        match self.store.append(&record) {
            Ok(id) => {
                log::info!(
                    "Sample saved: id={} sleep_score={} sleep_stage={}",
                    id,
                    record.sleep_score,
                    record.sleep_stage
                );
                Ok(Ingested { id, record })
            }
            Err(e) => {
                log::error!("Error writing record: {}", e);
                Err(IngestError::StorageFailure(e))
            }
        }
    }
}
