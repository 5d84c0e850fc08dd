//! Motion analysis
//!
//! Converts an accelerometer reading into a stillness score. The deviation of
//! the vector magnitude from standard gravity measures motion energy beyond
//! gravity alone; the score is a fixed set of bands, not a continuous curve.

use crate::types::Accel;

/// Gravity baseline (m/s²)
pub const GRAVITY: f64 = 9.8;

/// Deviation above which the wearer is moving significantly
pub const SIGNIFICANT_MOVEMENT: f64 = 1.5;

/// Deviation above which the wearer is moving mildly
pub const MILD_MOVEMENT: f64 = 0.5;

/// Score when no accelerometer reading is present
pub const NO_ACCEL_SCORE: u8 = 100;

/// Motion analyzer for computing the movement (stillness) score
pub struct MotionAnalyzer;

impl MotionAnalyzer {
    /// Absolute deviation of the acceleration magnitude from gravity
    pub fn deviation(accel: &Accel) -> f64 {
        (accel.magnitude() - GRAVITY).abs()
    }

    /// Movement score for an optional reading; higher means stiller
    pub fn movement_score(accel: Option<&Accel>) -> u8 {
        match accel {
            Some(accel) => score_for_deviation(Self::deviation(accel)),
            // Missing accelerometer counts as maximally still
            None => NO_ACCEL_SCORE,
        }
    }
}

/// Map a deviation onto the stillness bands
pub fn score_for_deviation(deviation: f64) -> u8 {
    if deviation > SIGNIFICANT_MOVEMENT {
        40
    } else if deviation > MILD_MOVEMENT {
        70
    } else {
        95
    }
}
