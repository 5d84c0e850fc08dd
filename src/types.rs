//! Core types for the Imsoniack pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: the incoming sensor sample, the filtered sample, the per-sample
//! assessment and the enriched record handed to storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Three-axis accelerometer reading (m/s²)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accel {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Accel {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the acceleration vector
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One sample as posted by the wearable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Accelerometer reading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accel: Option<Accel>,
    /// Heart rate (bpm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// Blood oxygen saturation (percent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo2: Option<f64>,
    /// Body temperature, passed through unmodified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Caller-supplied ISO-8601 timestamp used instead of ingest time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_timestamp: Option<String>,
    /// Any other fields the device sent; stored untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reason a reading was discarded by the signal filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterFlag {
    /// Gross motion made the optical readings unreliable
    MotionNoise,
    HeartRateOutOfRange,
    Spo2OutOfRange,
}

/// Optical readings after noise suppression and range rejection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredReadings {
    /// Heart rate, `None` if absent or discarded
    pub heart_rate: Option<f64>,
    /// SpO2, `None` if absent or discarded
    pub spo2: Option<f64>,
    /// What the filter discarded, in pass order
    pub flags: Vec<FilterFlag>,
}

/// Sleep stage label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SleepStage {
    Awake,
    Light,
    Deep,
    #[serde(rename = "REM")]
    Rem,
}

impl SleepStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::Awake => "Awake",
            SleepStage::Light => "Light",
            SleepStage::Deep => "Deep",
            SleepStage::Rem => "REM",
        }
    }
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermediate scores computed for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAssessment {
    /// Stillness score: 40, 70, 95 or 100
    pub movement_score: u8,
    /// Resting heart-rate score: 0, 50, 70 or 95
    pub hr_score: u8,
    /// Weighted blend, 0-100
    pub sleep_score: u8,
    pub sleep_stage: SleepStage,
    pub readings: FilteredReadings,
}

/// The record handed to the persistence adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accel: Option<Accel>,
    /// Filtered heart rate; serialized as null when discarded
    pub heart_rate: Option<f64>,
    /// Filtered SpO2; serialized as null when discarded
    pub spo2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub sleep_score: u8,
    pub sleep_stage: SleepStage,
    /// Effective timestamp: parsed `custom_timestamp` or ingest time
    pub server_timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identifier assigned by the persistence adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Fresh random identifier
    pub fn generate() -> Self {
        RecordId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record together with the id it was stored under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: EnrichedRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_magnitude() {
        let accel = Accel::new(3.0, 4.0, 0.0);
        assert!((accel.magnitude() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_keeps_unknown_fields() {
        let json = r#"{"heart_rate": 60, "device": "band-7", "battery": 81}"#;
        let sample: SensorSample = serde_json::from_str(json).unwrap();

        assert_eq!(sample.heart_rate, Some(60.0));
        assert_eq!(sample.extra["device"], "band-7");
        assert_eq!(sample.extra["battery"], 81);
        assert!(!sample.extra.contains_key("heart_rate"));
    }

    #[test]
    fn test_sleep_stage_labels() {
        assert_eq!(serde_json::to_string(&SleepStage::Rem).unwrap(), "\"REM\"");
        assert_eq!(serde_json::to_string(&SleepStage::Awake).unwrap(), "\"Awake\"");
        assert_eq!(SleepStage::Deep.to_string(), "Deep");
    }

    #[test]
    fn test_enriched_record_serializes_nulled_readings() {
        let record = EnrichedRecord {
            accel: None,
            heart_rate: None,
            spo2: None,
            temperature: Some(36.5),
            sleep_score: 60,
            sleep_stage: SleepStage::Deep,
            server_timestamp: "2024-01-15T22:00:00Z".parse().unwrap(),
            extra: Map::new(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value["heart_rate"].is_null());
        assert!(value.as_object().unwrap().contains_key("spo2"));
        assert!(!value.as_object().unwrap().contains_key("accel"));
        assert_eq!(value["sleep_stage"], "Deep");
    }
}
