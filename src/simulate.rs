//! Synthetic sample generation
//!
//! Produces a night of "good sleep" samples for exercising a deployment: one
//! sample per minute from Friday 22:00 to Saturday 06:00, resting heart rate,
//! high SpO2 and an almost motionless wrist. The night is placed in the time
//! zone of the `now` handed to [`NightWindow::previous_friday`]; the window and
//! the generated timestamps are stored in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::Rng;

use crate::types::{Accel, SensorSample};

/// Interval between generated samples
pub const SAMPLE_INTERVAL_SECS: i64 = 60;

/// A time span to generate samples for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl NightWindow {
    /// Most recent Friday 22:00 in `now`'s time zone that lies in the past,
    /// until Saturday 06:00 in the same zone
    pub fn previous_friday<Tz: TimeZone>(now: DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let now_utc = now.with_timezone(&Utc);

        // Days back to Friday, counting from Sunday = 0
        let days_back = (now.weekday().num_days_from_sunday() + 2) % 7;
        let mut friday = now.date_naive() - Duration::days(days_back as i64);
        let mut start = at_local_time(&tz, friday, 22, 0);

        if start > now_utc {
            friday -= Duration::days(7);
            start = at_local_time(&tz, friday, 22, 0);
        }

        let end = at_local_time(&tz, friday + Duration::days(1), 6, 0);
        Self { start, end }
    }

    /// Sample timestamps, both ends inclusive
    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        let step = Duration::seconds(SAMPLE_INTERVAL_SECS);
        std::iter::successors(Some(self.start), move |t| Some(*t + step))
            .take_while(move |t| *t <= self.end)
    }
}

/// Wall-clock time on `date` in `tz`; a time skipped by a DST jump is read as UTC
fn at_local_time<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    hour: u32,
    minute: u32,
) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => naive.and_utc(),
    }
}

/// Generator for resting-sleep samples
pub struct SleepNightGenerator<R> {
    rng: R,
}

impl<R: Rng> SleepNightGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// One resting sample stamped with `at`
    pub fn sample_at(&mut self, at: DateTime<Utc>) -> SensorSample {
        let heart_rate = self.rng.random_range(50..=70) as f64;
        let spo2 = self.rng.random_range(97..=100) as f64;
        let temperature = 36.5 + self.rng.random_range(0.0..0.2);
        let accel = Accel::new(
            self.rng.random_range(-0.05..0.05),
            self.rng.random_range(-0.05..0.05),
            9.8 + self.rng.random_range(-0.05..0.05),
        );

        SensorSample {
            accel: Some(accel),
            heart_rate: Some(heart_rate),
            spo2: Some(spo2),
            temperature: Some(temperature),
            custom_timestamp: Some(at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            ..Default::default()
        }
    }

    /// Every sample of the night, in time order
    pub fn generate(&mut self, window: &NightWindow) -> Vec<SensorSample> {
        window.timestamps().map(|at| self.sample_at(at)).collect()
    }
}

/// The fixed sample used to smoke-test a deployment
pub fn dummy_sample() -> SensorSample {
    SensorSample {
        accel: Some(Accel::new(0.1, 0.2, 9.8)),
        heart_rate: Some(75.0),
        spo2: Some(98.0),
        temperature: Some(36.5),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::assess_sample;
    use crate::schema::parse_custom_timestamp;
    use chrono::{FixedOffset, Weekday};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_window_from_midweek() {
        // Wednesday 2024-01-17
        let window = NightWindow::previous_friday(utc(2024, 1, 17, 12, 0));
        assert_eq!(window.start, utc(2024, 1, 12, 22, 0));
        assert_eq!(window.end, utc(2024, 1, 13, 6, 0));
        assert_eq!(window.start.weekday(), Weekday::Fri);
    }

    #[test]
    fn test_window_on_friday_before_ten() {
        // Friday afternoon: tonight has not started, use last week
        let window = NightWindow::previous_friday(utc(2024, 1, 19, 15, 0));
        assert_eq!(window.start, utc(2024, 1, 12, 22, 0));
    }

    #[test]
    fn test_window_on_friday_night() {
        let window = NightWindow::previous_friday(utc(2024, 1, 19, 23, 30));
        assert_eq!(window.start, utc(2024, 1, 19, 22, 0));
        assert_eq!(window.end, utc(2024, 1, 20, 6, 0));
    }

    #[test]
    fn test_window_on_saturday() {
        let window = NightWindow::previous_friday(utc(2024, 1, 20, 9, 0));
        assert_eq!(window.start, utc(2024, 1, 19, 22, 0));
    }

    #[test]
    fn test_window_follows_caller_time_zone() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        // Wednesday noon in Tokyo: Friday 22:00 +09:00 is 13:00 UTC
        let now = tokyo.with_ymd_and_hms(2024, 1, 17, 12, 0, 0).unwrap();
        let window = NightWindow::previous_friday(now);
        assert_eq!(window.start, utc(2024, 1, 12, 13, 0));
        assert_eq!(window.end, utc(2024, 1, 12, 21, 0));
    }

    #[test]
    fn test_window_uses_local_weekday() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        // Friday 15:00 UTC is already Saturday 00:00 in Tokyo, so tonight counts
        let now = utc(2024, 1, 19, 15, 0).with_timezone(&tokyo);
        let window = NightWindow::previous_friday(now);
        assert_eq!(window.start, utc(2024, 1, 19, 13, 0));
        assert_eq!(window.timestamps().count(), 481);
    }

    #[test]
    fn test_one_sample_per_minute_inclusive() {
        let window = NightWindow::previous_friday(utc(2024, 1, 17, 12, 0));
        let mut generator = SleepNightGenerator::new(StdRng::seed_from_u64(7));
        let samples = generator.generate(&window);

        // 8 hours of minutes plus the closing sample
        assert_eq!(samples.len(), 481);

        let stamp = |i: usize| samples[i].custom_timestamp.as_deref().unwrap();
        let first = parse_custom_timestamp(stamp(0)).unwrap();
        let last = parse_custom_timestamp(stamp(480)).unwrap();
        assert_eq!(first, window.start);
        assert_eq!(last, window.end);
    }

    #[test]
    fn test_samples_look_like_resting_sleep() {
        let window = NightWindow::previous_friday(utc(2024, 1, 17, 12, 0));
        let mut generator = SleepNightGenerator::new(StdRng::seed_from_u64(42));

        for sample in generator.generate(&window) {
            let hr = sample.heart_rate.unwrap();
            let spo2 = sample.spo2.unwrap();
            assert!((50.0..=70.0).contains(&hr));
            assert!((97.0..=100.0).contains(&spo2));

            let assessment = assess_sample(&sample);
            assert_eq!(assessment.movement_score, 95);
            assert!(assessment.readings.flags.is_empty());
        }
    }

    #[test]
    fn test_dummy_sample_scores() {
        let assessment = assess_sample(&dummy_sample());
        assert_eq!(assessment.sleep_score, 95);
    }
}
