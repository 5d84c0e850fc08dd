//! Signal filtering
//!
//! This module cleans the optical readings of a sample:
//! - Noise suppression: gross motion invalidates heart rate and SpO2
//! - Range rejection: physiologically impossible values are discarded
//!
//! Discarded values become `None`; nothing is ever clamped.

use crate::motion::MotionAnalyzer;
use crate::types::{FilterFlag, FilteredReadings, SensorSample};

/// Deviation above which optical sensors are considered noise
pub const OPTICAL_NOISE_DEVIATION: f64 = 3.0;

/// Plausible heart-rate range (bpm, inclusive)
pub const HEART_RATE_RANGE: (f64, f64) = (30.0, 200.0);

/// Plausible SpO2 range (percent, inclusive)
pub const SPO2_RANGE: (f64, f64) = (50.0, 100.0);

/// Signal filter for producing cleaned optical readings
pub struct SignalFilter;

impl SignalFilter {
    /// Run both passes over a sample, noise suppression first
    pub fn filter(sample: &SensorSample) -> FilteredReadings {
        let readings = FilteredReadings {
            heart_rate: sample.heart_rate,
            spo2: sample.spo2,
            flags: Vec::new(),
        };

        let readings = suppress_motion_noise(readings, sample);
        reject_impossible_values(readings)
    }
}

/// Discard heart rate and SpO2 when the wearer is moving grossly
pub fn suppress_motion_noise(
    mut readings: FilteredReadings,
    sample: &SensorSample,
) -> FilteredReadings {
    let Some(accel) = &sample.accel else {
        return readings;
    };

    let deviation = MotionAnalyzer::deviation(accel);
    if deviation > OPTICAL_NOISE_DEVIATION {
        log::debug!(
            "High movement detected (deviation {:.2}), discarding optical readings",
            deviation
        );
        readings.heart_rate = None;
        readings.spo2 = None;
        push_flag(&mut readings.flags, FilterFlag::MotionNoise);
    }

    readings
}

/// Discard readings outside physiological bounds
pub fn reject_impossible_values(mut readings: FilteredReadings) -> FilteredReadings {
    if let Some(hr) = readings.heart_rate {
        if !within(hr, HEART_RATE_RANGE) {
            readings.heart_rate = None;
            push_flag(&mut readings.flags, FilterFlag::HeartRateOutOfRange);
        }
    }

    if let Some(spo2) = readings.spo2 {
        if !within(spo2, SPO2_RANGE) {
            readings.spo2 = None;
            push_flag(&mut readings.flags, FilterFlag::Spo2OutOfRange);
        }
    }

    readings
}

fn within(value: f64, (min, max): (f64, f64)) -> bool {
    value >= min && value <= max
}

fn push_flag(flags: &mut Vec<FilterFlag>, flag: FilterFlag) {
    if !flags.contains(&flag) {
        flags.push(flag);
    }
}
