//! # Brightness Curve
//!
//! Daylight intensity over the sun-up window as a three-part piecewise
//! function:
//!
//! - **Sunrise ramp**: cubic ease-in up to the plateau base (`255 * ratio`)
//! - **Midday plateau**: inverted parabola peaking at
//!   `255 * ratio + (255 - 255 * ratio) * max_intensity / 100`
//! - **Sunset ramp**: mirrored cubic ease-out back to zero
//!
//! The segment boundaries are computed once in [`DaySegments`] and shared
//! with the color mixer so both curves agree on where midday starts.

/// Full-scale brightness factor
pub const MAX_FACTOR: f64 = 255.0;

/// Segment boundaries of one simulated day, in seconds after midnight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySegments {
    pub sunrise: f64,
    pub ramp: f64,
    pub mid: f64,
    pub ramp_end: f64,
    pub mid_end: f64,
    pub mid_ratio: f64,
}

impl DaySegments {
    pub fn new(sunrise_sec: i64, duration_sec: i64, mid_ratio: f64) -> Self {
        let sunrise = sunrise_sec as f64;
        let duration = duration_sec as f64;
        let mid = duration * mid_ratio;
        let ramp = (duration - mid) / 2.0;
        let ramp_end = sunrise + ramp;
        Self {
            sunrise,
            ramp,
            mid,
            ramp_end,
            mid_end: ramp_end + mid,
            mid_ratio,
        }
    }

    /// True outside the midday plateau (sunrise or sunset ramp)
    pub fn is_ramp(&self, now_sec: f64) -> bool {
        now_sec <= self.ramp_end || now_sec > self.mid_end
    }

    fn ramp_ceiling(&self) -> f64 {
        MAX_FACTOR * self.mid_ratio
    }
}

/// Brightness factor in `0..=255` at `now_sec`.
///
/// `max_intensity_pct` scales only the plateau's height above the ramp
/// ceiling. A zero-length ramp (ratio of 1) contributes nothing.
pub fn brightness_factor(segments: &DaySegments, now_sec: i64, max_intensity_pct: f64) -> u8 {
    let now = now_sec as f64;
    let ceiling = segments.ramp_ceiling();

    let brightness = if now <= segments.ramp_end && segments.ramp > 0.0 {
        let x = (now - segments.sunrise) / segments.ramp;
        x.powi(3) * ceiling
    } else if now <= segments.mid_end {
        let x = 2.0 * (now - segments.ramp_end) / segments.mid - 1.0;
        let extra = (MAX_FACTOR - ceiling) * (max_intensity_pct / 100.0);
        (1.0 - x.powi(2)) * extra + ceiling
    } else if segments.ramp > 0.0 {
        let x = 1.0 - (now - segments.mid_end) / segments.ramp;
        x.powi(3) * ceiling
    } else {
        0.0
    };

    to_channel(brightness)
}

/// Round to nearest and clamp into a channel value; NaN maps to 0
pub(crate) fn to_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, MAX_FACTOR) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SIX_AM: i64 = 6 * 3600;
    const SIXTEEN_HOURS: i64 = 16 * 3600;

    fn default_segments() -> DaySegments {
        DaySegments::new(SIX_AM, SIXTEEN_HOURS, 1.0 / 3.0)
    }

    #[test]
    fn test_segment_boundaries() {
        let s = default_segments();
        assert_eq!(s.ramp, 19_200.0);
        assert_eq!(s.ramp_end, 40_800.0); // 11:20
        assert_eq!(s.mid_end, 60_000.0); // 16:40
    }

    #[test]
    fn test_zero_at_sunrise_and_sunset() {
        let s = default_segments();
        assert_eq!(brightness_factor(&s, SIX_AM, 100.0), 0);
        assert_eq!(brightness_factor(&s, SIX_AM + SIXTEEN_HOURS, 100.0), 0);
    }

    #[test]
    fn test_ramp_reaches_plateau_base() {
        let s = default_segments();
        assert_eq!(brightness_factor(&s, s.ramp_end as i64, 100.0), 85);
        assert_eq!(brightness_factor(&s, s.mid_end as i64, 100.0), 85);
    }

    #[test]
    fn test_plateau_peak_follows_max_intensity() {
        let s = default_segments();
        let peak = (s.ramp_end + s.mid / 2.0) as i64;
        assert_eq!(brightness_factor(&s, peak, 100.0), 255);
        assert_eq!(brightness_factor(&s, peak, 50.0), 170);
        assert_eq!(brightness_factor(&s, peak, 30.0), 136);
    }

    #[test]
    fn test_full_ratio_has_no_ramps() {
        let s = DaySegments::new(SIX_AM, SIXTEEN_HOURS, 1.0);
        assert_eq!(s.ramp, 0.0);
        assert_eq!(brightness_factor(&s, SIX_AM, 100.0), 255);
        assert_eq!(brightness_factor(&s, SIX_AM + SIXTEEN_HOURS / 2, 100.0), 255);
        assert_eq!(brightness_factor(&s, SIX_AM + SIXTEEN_HOURS + 1, 100.0), 0);
    }

    #[test]
    fn test_to_channel_clamps() {
        assert_eq!(to_channel(-3.0), 0);
        assert_eq!(to_channel(300.0), 255);
        assert_eq!(to_channel(127.5), 128);
        assert_eq!(to_channel(f64::NAN), 0);
    }

    proptest! {
        #[test]
        fn sunrise_ramp_is_non_decreasing(a in 0i64..19_200, b in 0i64..19_200) {
            let s = default_segments();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(brightness_factor(&s, SIX_AM + lo, 100.0) <= brightness_factor(&s, SIX_AM + hi, 100.0));
        }

        #[test]
        fn sunset_ramp_is_non_increasing(a in 0i64..19_200, b in 0i64..19_200) {
            let s = default_segments();
            let start = s.mid_end as i64;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(brightness_factor(&s, start + lo, 100.0) >= brightness_factor(&s, start + hi, 100.0));
        }
    }
}
