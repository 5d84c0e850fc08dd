//! Sleep stage classification
//!
//! A fixed decision table over the movement score and the filtered heart rate.
//! No transition history is kept between samples.

use crate::types::SleepStage;

/// Movement score at or below which the wearer is awake
pub const AWAKE_MOVEMENT_CEILING: u8 = 40;

/// Movement score at or above which the wearer is still enough for Deep/REM
pub const STILL_MOVEMENT_FLOOR: u8 = 95;

/// Heart rate below which a still wearer is in deep sleep (bpm)
pub const DEEP_SLEEP_HR_CEILING: f64 = 60.0;

/// Stage classifier
pub struct StageClassifier;

impl StageClassifier {
    /// Classify a sample; first matching rule wins
    pub fn classify(movement_score: u8, heart_rate: Option<f64>) -> SleepStage {
        if movement_score <= AWAKE_MOVEMENT_CEILING {
            return SleepStage::Awake;
        }

        if movement_score < STILL_MOVEMENT_FLOOR {
            return SleepStage::Light;
        }

        match heart_rate {
            // Known defect carried from the stored history: a still wearer with
            // no optical reading is labelled Deep.
            None => SleepStage::Deep,
            Some(hr) if hr < DEEP_SLEEP_HR_CEILING => SleepStage::Deep,
            Some(_) => SleepStage::Rem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_means_awake() {
        assert_eq!(StageClassifier::classify(40, Some(55.0)), SleepStage::Awake);
        assert_eq!(StageClassifier::classify(40, None), SleepStage::Awake);
        assert_eq!(StageClassifier::classify(0, Some(80.0)), SleepStage::Awake);
    }

    #[test]
    fn test_mild_movement_is_light() {
        assert_eq!(StageClassifier::classify(70, Some(55.0)), SleepStage::Light);
        assert_eq!(StageClassifier::classify(70, Some(80.0)), SleepStage::Light);
        assert_eq!(StageClassifier::classify(70, None), SleepStage::Light);
    }

    #[test]
    fn test_still_with_low_heart_rate_is_deep() {
        assert_eq!(StageClassifier::classify(95, Some(55.0)), SleepStage::Deep);
        assert_eq!(StageClassifier::classify(100, Some(45.0)), SleepStage::Deep);
        assert_eq!(StageClassifier::classify(95, Some(59.9)), SleepStage::Deep);
    }

    #[test]
    fn test_still_with_active_heart_rate_is_rem() {
        assert_eq!(StageClassifier::classify(95, Some(60.0)), SleepStage::Rem);
        assert_eq!(StageClassifier::classify(100, Some(70.0)), SleepStage::Rem);
    }

    #[test]
    fn test_still_without_heart_rate_is_deep() {
        assert_eq!(StageClassifier::classify(95, None), SleepStage::Deep);
        assert_eq!(StageClassifier::classify(100, None), SleepStage::Deep);
    }

    #[test]
    fn test_classification_is_total() {
        let heart_rates = [None, Some(30.0), Some(59.0), Some(60.0), Some(120.0), Some(200.0)];
        for movement in 0..=u8::MAX {
            for hr in heart_rates {
                let stage = StageClassifier::classify(movement, hr);
                assert!(matches!(
                    stage,
                    SleepStage::Awake | SleepStage::Light | SleepStage::Deep | SleepStage::Rem
                ));
            }
        }
    }
}
