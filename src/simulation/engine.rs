use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::color::{self, Rgbw};
use super::curve::{self, DaySegments};
use super::phase::{self, TimeOfDay};
use crate::domain::{ClockTime, LightingConfig, SimulationError};

/// Sampling step of the distribution table, in simulated minutes
pub const DISTRIBUTION_STEP_MINUTES: u32 = 10;

/// One instant of the simulated sun
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    #[serde(rename = "on")]
    pub is_on: bool,
    #[serde(rename = "brightness")]
    pub brightness_percent: u8,
    pub rgbw: Rgbw,
    pub time_of_day: TimeOfDay,
    pub cycle_percentage: f64,
}

impl SimulationResult {
    /// The `{on, brightness, rgbw}` shape consumed by older automations
    pub fn legacy(&self) -> LegacySunPayload {
        LegacySunPayload {
            on: self.is_on,
            brightness: self.brightness_percent,
            rgbw: self.rgbw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegacySunPayload {
    pub on: bool,
    pub brightness: u8,
    pub rgbw: Rgbw,
}

/// One row of the chart table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionPoint {
    pub time: String,
    pub brightness: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
}

/// Evaluate the daylight curve at `time`. Expects a validated config.
pub fn simulate(time: NaiveTime, config: &LightingConfig) -> SimulationResult {
    let now = ClockTime::from(time).seconds_of_day();
    let sunrise = config.sunrise_seconds();
    let duration = config.duration_seconds();

    let phase = phase::classify(sunrise, duration, now);
    if !phase.is_on {
        return SimulationResult {
            is_on: false,
            brightness_percent: 0,
            rgbw: Rgbw::default(),
            time_of_day: phase.time_of_day,
            cycle_percentage: phase.cycle_percentage,
        };
    }

    let segments = DaySegments::new(sunrise, duration, config.high_light_ratio);
    let factor = curve::brightness_factor(&segments, now, config.max_intensity);
    // Lights must never receive 0 while on
    let brightness_percent = ((factor as f64 / curve::MAX_FACTOR * 100.0).round() as u8).max(1);

    SimulationResult {
        is_on: true,
        brightness_percent,
        rgbw: color::mix(factor, now, &segments),
        time_of_day: phase.time_of_day,
        cycle_percentage: phase.cycle_percentage,
    }
}

pub fn simulate_checked(
    time: NaiveTime,
    config: &LightingConfig,
) -> Result<SimulationResult, SimulationError> {
    config.validate_config()?;
    Ok(simulate(time, config))
}

/// Sample the curve every ten simulated minutes across the sun-up window.
///
/// Covers whole hours from the sunrise hour for `duration.hour` hours;
/// labels wrap past midnight. Each call yields a fresh iterator.
pub fn distribution(config: LightingConfig) -> impl Iterator<Item = DistributionPoint> {
    let start = config.sunrise_time.hour * 60;
    let end = (config.sunrise_time.hour + config.duration.hour) * 60;

    (start..end)
        .step_by(DISTRIBUTION_STEP_MINUTES as usize)
        .filter_map(move |minute| {
            let time = NaiveTime::from_hms_opt((minute / 60) % 24, minute % 60, 0)?;
            let sim = simulate(time, &config);
            Some(DistributionPoint {
                time: time.format("%H:%M").to_string(),
                brightness: sim.brightness_percent,
                red: sim.rgbw.red,
                green: sim.rgbw.green,
                blue: sim.rgbw.blue,
                white: sim.rgbw.white,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_sunrise_instant_is_on_with_floor_brightness() {
        let r = simulate(at(6, 0, 0), &LightingConfig::default());
        assert!(r.is_on);
        assert_eq!(r.brightness_percent, 1);
        assert_eq!(r.time_of_day, TimeOfDay::Sunrise);
        assert_eq!(r.rgbw, Rgbw { red: 1, green: 0, blue: 0, white: 0 });
    }

    #[test]
    fn test_midday_peak() {
        let r = simulate(at(14, 0, 0), &LightingConfig::default());
        assert!(r.is_on);
        assert_eq!(r.brightness_percent, 100);
        assert_eq!(r.time_of_day, TimeOfDay::Day);
        assert_eq!(r.rgbw, Rgbw { red: 255, green: 255, blue: 255, white: 255 });
    }

    #[test]
    fn test_before_sunrise_is_night() {
        let r = simulate(at(5, 0, 0), &LightingConfig::default());
        assert!(!r.is_on);
        assert_eq!(r.brightness_percent, 0);
        assert_eq!(r.rgbw, Rgbw::default());
        assert_eq!(r.time_of_day, TimeOfDay::Night);
    }

    #[test]
    fn test_sunset_boundary_is_inclusive() {
        let cfg = LightingConfig::default();
        let r = simulate(at(22, 0, 0), &cfg);
        assert!(r.is_on);
        assert_eq!(r.brightness_percent, 1);
        assert_eq!(r.time_of_day, TimeOfDay::Sunset);
        assert_eq!(r.cycle_percentage, 100.0);

        let r = simulate(at(22, 0, 1), &cfg);
        assert!(!r.is_on);
        assert_eq!(r.time_of_day, TimeOfDay::Night);
    }

    #[test]
    fn test_reduced_intensity_lowers_peak() {
        let cfg = LightingConfig { max_intensity: 50.0, ..Default::default() };
        let r = simulate(at(14, 0, 0), &cfg);
        assert_eq!(r.brightness_percent, 67);
    }

    #[test]
    fn test_simulate_is_deterministic() {
        let cfg = LightingConfig::default();
        let t = at(9, 17, 43);
        let a = simulate(t, &cfg);
        let b = simulate(t, &cfg);
        assert_eq!(a, b);
        assert_eq!(a.cycle_percentage.to_bits(), b.cycle_percentage.to_bits());
    }

    #[test]
    fn test_simulate_checked_rejects_invalid() {
        let cfg = LightingConfig { high_light_ratio: 0.0, ..Default::default() };
        assert!(simulate_checked(at(12, 0, 0), &cfg).is_err());
    }

    #[test]
    fn test_distribution_covers_window() {
        let points: Vec<_> = distribution(LightingConfig::default()).collect();
        assert_eq!(points.len(), 96);
        assert_eq!(points[0].time, "06:00");
        assert_eq!(points[1].time, "06:10");
        assert_eq!(points[95].time, "21:50");
        assert_eq!(points[0].brightness, 1);
        assert!(points.iter().any(|p| p.brightness == 100));
    }

    #[test]
    fn test_distribution_is_restartable() {
        let cfg = LightingConfig::default();
        let first: Vec<_> = distribution(cfg).collect();
        let second: Vec<_> = distribution(cfg).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_distribution_labels_wrap_midnight() {
        let cfg = LightingConfig {
            sunrise_time: ClockTime::new(20, 0, 0),
            duration: ClockTime::new(6, 0, 0),
            ..Default::default()
        };
        let points: Vec<_> = distribution(cfg).collect();
        assert_eq!(points.len(), 36);
        assert_eq!(points[24].time, "00:00");
        assert_eq!(points.last().unwrap().time, "01:50");
    }

    #[test]
    fn test_result_json_shape() {
        let r = simulate(at(14, 0, 0), &LightingConfig::default());
        let v = serde_json::to_value(r).unwrap();
        assert_eq!(v["on"], true);
        assert_eq!(v["brightness"], 100);
        assert_eq!(v["timeOfDay"], "day");
        assert_eq!(v["rgbw"]["white"], 255);
        assert!(v.get("cyclePercentage").is_some());

        let legacy = serde_json::to_value(r.legacy()).unwrap();
        assert!(legacy.get("timeOfDay").is_none());
        assert_eq!(legacy["brightness"], 100);
    }
}
