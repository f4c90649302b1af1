use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::domain::SECONDS_PER_DAY;

/// Length of the sunrise and sunset windows in seconds
pub const TRANSITION_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeOfDay {
    Night,
    Sunrise,
    Day,
    Sunset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub is_on: bool,
    pub time_of_day: TimeOfDay,
    /// Progress through the current phase, 0-100
    pub cycle_percentage: f64,
}

/// Classify `now_sec` against a sun-up window starting at `sunrise_sec`.
///
/// The window is inclusive at both ends and is not wrapped past midnight.
/// Night progress is measured against the night length `86400 - duration`
/// and always stays within 0-100.
pub fn classify(sunrise_sec: i64, duration_sec: i64, now_sec: i64) -> Phase {
    let sunset_sec = sunrise_sec + duration_sec;
    let is_on = now_sec >= sunrise_sec && now_sec <= sunset_sec;

    if !is_on {
        // Measured from the most recent sunset on the 24h clock. When the
        // window runs past midnight the early hours before the wrapped
        // sunset are still dark but count as a finished night.
        let total_night = (SECONDS_PER_DAY - duration_sec).max(1) as f64;
        let since_sunset = (now_sec - sunset_sec).rem_euclid(SECONDS_PER_DAY) as f64;
        let cycle_percentage = (since_sunset / total_night * 100.0).clamp(0.0, 100.0);
        return Phase {
            is_on,
            time_of_day: TimeOfDay::Night,
            cycle_percentage,
        };
    }

    let sunrise_end = sunrise_sec + TRANSITION_SECS;
    let sunset_start = sunset_sec - TRANSITION_SECS;
    let transition = TRANSITION_SECS as f64;

    // With a window shorter than two transitions the day branch is
    // unreachable, so its denominator is always positive.
    let (time_of_day, cycle_percentage) = if now_sec <= sunrise_end {
        let pct = (now_sec - sunrise_sec) as f64 / transition * 100.0;
        (TimeOfDay::Sunrise, pct.min(100.0))
    } else if now_sec >= sunset_start {
        let pct = (now_sec - sunset_start) as f64 / transition * 100.0;
        (TimeOfDay::Sunset, pct.min(100.0))
    } else {
        let pct = (now_sec - sunrise_end) as f64 / (sunset_start - sunrise_end) as f64 * 100.0;
        (TimeOfDay::Day, pct)
    };

    Phase {
        is_on,
        time_of_day,
        cycle_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SUNRISE: i64 = 6 * 3600;
    const DURATION: i64 = 16 * 3600;

    #[rstest]
    #[case(5 * 3600, TimeOfDay::Night)]
    #[case(6 * 3600, TimeOfDay::Sunrise)]
    #[case(7 * 3600, TimeOfDay::Sunrise)]
    #[case(7 * 3600 + 1, TimeOfDay::Day)]
    #[case(14 * 3600, TimeOfDay::Day)]
    #[case(21 * 3600, TimeOfDay::Sunset)]
    #[case(22 * 3600, TimeOfDay::Sunset)]
    #[case(22 * 3600 + 1, TimeOfDay::Night)]
    fn test_phase_labels(#[case] now: i64, #[case] expected: TimeOfDay) {
        assert_eq!(classify(SUNRISE, DURATION, now).time_of_day, expected);
    }

    #[test]
    fn test_sunrise_progress_hits_100_at_window_end() {
        let p = classify(SUNRISE, DURATION, SUNRISE + 1800);
        assert!((p.cycle_percentage - 50.0).abs() < 1e-9);
        let p = classify(SUNRISE, DURATION, SUNRISE + TRANSITION_SECS);
        assert_eq!(p.cycle_percentage, 100.0);
    }

    #[test]
    fn test_day_progress_spans_between_windows() {
        // 07:00 -> 21:00 is the day span; 14:00 is halfway
        let p = classify(SUNRISE, DURATION, 14 * 3600);
        assert!((p.cycle_percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_night_progress() {
        // 8h night; 02:00 is 4h before sunrise
        let p = classify(SUNRISE, DURATION, 2 * 3600);
        assert!(!p.is_on);
        assert!((p.cycle_percentage - 50.0).abs() < 1e-9);

        // 23:00 is 1h after sunset
        let p = classify(SUNRISE, DURATION, 23 * 3600);
        assert!((p.cycle_percentage - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_night_progress_when_window_crosses_midnight() {
        // 20:00 + 6h sets at 02:00 the next day
        let sunrise = 20 * 3600;
        let duration = 6 * 3600;

        let p = classify(sunrise, duration, 3600);
        assert!(!p.is_on);
        assert_eq!(p.cycle_percentage, 100.0);

        // 03:00 is 1h into an 18h night
        let p = classify(sunrise, duration, 3 * 3600);
        assert!((p.cycle_percentage - 100.0 / 18.0).abs() < 1e-9);

        for now in (0..SECONDS_PER_DAY).step_by(300) {
            let pct = classify(sunrise, duration, now).cycle_percentage;
            assert!((0.0..=100.0).contains(&pct), "{now}: {pct}");
        }
    }

    #[test]
    fn test_short_window_has_no_day_phase() {
        let duration = 90 * 60;
        for offset in (0..=duration).step_by(60) {
            let p = classify(SUNRISE, duration, SUNRISE + offset);
            assert_ne!(p.time_of_day, TimeOfDay::Day);
            assert!(p.cycle_percentage.is_finite());
        }
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(TimeOfDay::Sunset.to_string(), "sunset");
        assert_eq!("night".parse::<TimeOfDay>().unwrap(), TimeOfDay::Night);
    }
}
