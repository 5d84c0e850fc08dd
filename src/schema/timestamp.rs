//! Caller-supplied timestamp parsing
//!
//! Accepted ISO-8601 forms:
//! - RFC 3339 with an offset (`2024-01-15T22:30:00Z`, `...+07:00`)
//! - a date-time without an offset, taken as UTC
//! - a bare date, taken as UTC midnight

use crate::error::IngestError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601 timestamp string into UTC
pub fn parse_custom_timestamp(raw: &str) -> Result<DateTime<Utc>, IngestError> {
    let trimmed = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(IngestError::InvalidTimestamp(format!(
        "'{raw}' is not an ISO-8601 date"
    )))
}

/// Resolve the caller's timestamp, if any; an empty string counts as absent
pub fn resolve_timestamp(custom: Option<&str>) -> Result<Option<DateTime<Utc>>, IngestError> {
    match custom {
        Some(raw) if !raw.trim().is_empty() => parse_custom_timestamp(raw).map(Some),
        _ => Ok(None),
    }
}
