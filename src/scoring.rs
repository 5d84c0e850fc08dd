//! Score derivation
//!
//! This module turns filtered signals into scores:
//! - Heart-rate score relative to a resting reference range
//! - Composite sleep score (60% movement, 40% heart rate)

/// Score for a missing or discarded heart rate
pub const NO_HEART_RATE_SCORE: u8 = 0;

/// Weight of the movement score, in tenths
const MOVEMENT_WEIGHT: u32 = 6;

/// Weight of the heart-rate score, in tenths
const HEART_RATE_WEIGHT: u32 = 4;

/// Heart-rate scorer
pub struct HeartRateScorer;

impl HeartRateScorer {
    /// Score a filtered heart rate; higher means closer to resting
    pub fn score(heart_rate: Option<f64>) -> u8 {
        let Some(hr) = heart_rate else {
            return NO_HEART_RATE_SCORE;
        };

        if !(40.0..=110.0).contains(&hr) {
            // Implausible but present, or very active
            50
        } else if hr > 90.0 {
            70
        } else {
            // 40-90 bpm; the 40-50 band is treated as resting
            95
        }
    }
}

/// Weighted blend of movement and heart-rate scores
pub struct SleepScoreCombiner;

impl SleepScoreCombiner {
    /// `round(movement × 0.6 + hr × 0.4)`, rounding halves up
    pub fn combine(movement_score: u8, hr_score: u8) -> u8 {
        let weighted =
            movement_score as u32 * MOVEMENT_WEIGHT + hr_score as u32 * HEART_RATE_WEIGHT;
        // Integer arithmetic in tenths keeps the rounding exact
        let rounded = (weighted + 5) / 10;
        rounded.min(100) as u8
    }
}
