//! Request body validation
//!
//! An absent body, a non-object body or an object with no fields is rejected.
//! Missing sensor fields are fine: they represent sensor dropout.

use crate::error::IngestError;
use crate::types::SensorSample;
use serde::Deserialize;
use serde_json::Value;

/// Validator for incoming request bodies
pub struct Validator;

impl Validator {
    /// Check a parsed body and decode it into a sample
    pub fn validate(body: Option<&Value>) -> Result<SensorSample, IngestError> {
        let (body, object) = match body {
            None | Some(Value::Null) => {
                return Err(IngestError::InvalidInput("no JSON data provided".to_string()))
            }
            Some(body @ Value::Object(object)) => (body, object),
            Some(other) => {
                return Err(IngestError::InvalidInput(format!(
                    "expected a JSON object, got {}",
                    json_type_name(other)
                )))
            }
        };

        if object.is_empty() {
            return Err(IngestError::InvalidInput("no JSON data provided".to_string()));
        }

        decode(body)
    }

    /// Parse raw body bytes; an empty body counts as absent
    pub fn validate_bytes(bytes: &[u8]) -> Result<SensorSample, IngestError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::validate(None);
        }

        let body: Value = serde_json::from_slice(bytes)
            .map_err(|e| IngestError::InvalidInput(format!("malformed JSON: {e}")))?;
        Self::validate(Some(&body))
    }

    /// Parse NDJSON (one body per line), skipping blank lines
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<NumberedBody>, IngestError> {
        let mut bodies = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let body = serde_json::from_str::<Value>(trimmed).map_err(|e| {
                IngestError::InvalidInput(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            bodies.push(NumberedBody {
                line: line_num + 1,
                body,
            });
        }
        Ok(bodies)
    }

    /// Validate a batch of bodies, returning only the failures
    pub fn validate_batch(bodies: &[NumberedBody]) -> Vec<ValidationResult> {
        bodies
            .iter()
            .filter_map(|numbered| {
                let error = Self::validate(Some(&numbered.body))
                    .and_then(|sample| {
                        super::resolve_timestamp(sample.custom_timestamp.as_deref()).map(|_| ())
                    })
                    .err()?;
                Some(ValidationResult {
                    line: numbered.line,
                    error,
                })
            })
            .collect()
    }
}

fn decode(body: &Value) -> Result<SensorSample, IngestError> {
    SensorSample::deserialize(body).map_err(|e| IngestError::InvalidInput(e.to_string()))
}

/// A body together with its 1-based input line
#[derive(Debug, Clone)]
pub struct NumberedBody {
    pub line: usize,
    pub body: Value,
}

/// A rejected body
#[derive(Debug)]
pub struct ValidationResult {
    pub line: usize,
    pub error: IngestError,
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Accel;
    use serde_json::json;

    #[test]
    fn test_absent_body_is_invalid() {
        assert!(matches!(
            Validator::validate(None),
            Err(IngestError::InvalidInput(_))
        ));
        assert!(matches!(
            Validator::validate(Some(&Value::Null)),
            Err(IngestError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_object_is_invalid() {
        let result = Validator::validate(Some(&json!({})));
        assert!(matches!(result, Err(IngestError::InvalidInput(_))));
    }

    #[test]
    fn test_non_object_is_invalid() {
        let err = Validator::validate(Some(&json!([1, 2, 3]))).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_dropout_fields_are_valid() {
        let sample = Validator::validate(Some(&json!({ "temperature": 36.5 }))).unwrap();
        assert_eq!(sample.temperature, Some(36.5));
        assert_eq!(sample.accel, None);
        assert_eq!(sample.heart_rate, None);
        assert_eq!(sample.spo2, None);
    }

    #[test]
    fn test_full_sample_decodes() {
        let body = json!({
            "heart_rate": 75,
            "spo2": 98,
            "temperature": 36.5,
            "accel": { "x": 0.1, "y": 0.2, "z": 9.8 }
        });
        let sample = Validator::validate(Some(&body)).unwrap();

        assert_eq!(sample.accel, Some(Accel::new(0.1, 0.2, 9.8)));
        assert_eq!(sample.heart_rate, Some(75.0));
        assert_eq!(sample.spo2, Some(98.0));
        assert!(sample.extra.is_empty());
    }

    #[test]
    fn test_wrong_field_type_is_invalid() {
        let result = Validator::validate(Some(&json!({ "heart_rate": "fast" })));
        assert!(matches!(result, Err(IngestError::InvalidInput(_))));

        let result = Validator::validate(Some(&json!({ "accel": { "x": 0.0, "y": 0.0 } })));
        assert!(matches!(result, Err(IngestError::InvalidInput(_))));
    }

    #[test]
    fn test_null_readings_are_dropout() {
        let body = json!({ "heart_rate": null, "spo2": null, "accel": null });
        let sample = Validator::validate(Some(&body)).unwrap();
        assert_eq!(sample.heart_rate, None);
        assert_eq!(sample.accel, None);
    }

    #[test]
    fn test_validate_bytes() {
        assert!(Validator::validate_bytes(b"").is_err());
        assert!(Validator::validate_bytes(b"  \n").is_err());
        assert!(Validator::validate_bytes(b"{not json").is_err());
        assert!(Validator::validate_bytes(br#"{"heart_rate": 60}"#).is_ok());
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = "{\"heart_rate\": 60}\n\n{\"spo2\": 97}\n";
        let bodies = Validator::parse_ndjson(ndjson).unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].line, 1);
        assert_eq!(bodies[1].line, 3);

        let err = Validator::parse_ndjson("{\"heart_rate\": 60}\nnope\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_validate_batch_reports_failures() {
        let bodies = Validator::parse_ndjson(
            "{\"heart_rate\": 60}\n{}\n{\"custom_timestamp\": \"yesterday\"}\n",
        )
        .unwrap();
        let failures = Validator::validate_batch(&bodies);

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].line, 2);
        assert!(matches!(failures[0].error, IngestError::InvalidInput(_)));
        assert_eq!(failures[1].line, 3);
        assert!(matches!(failures[1].error, IngestError::InvalidTimestamp(_)));
    }
}
