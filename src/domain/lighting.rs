use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

pub const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Lighting configuration errors
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid lighting config: {0}")]
    InvalidConfig(String),
}

impl From<validator::ValidationErrors> for SimulationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        SimulationError::InvalidConfig(errors.to_string())
    }
}

/// Wall-clock time or a span expressed in hours, minutes and seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Validate)]
pub struct ClockTime {
    #[validate(range(max = 23))]
    pub hour: u32,
    #[validate(range(max = 59))]
    pub minute: u32,
    #[validate(range(max = 59))]
    pub second: u32,
}

impl ClockTime {
    pub const fn new(hour: u32, minute: u32, second: u32) -> Self {
        Self { hour, minute, second }
    }

    /// Seconds elapsed since midnight. Out-of-range fields are not rejected,
    /// they simply carry into the total.
    pub fn seconds_of_day(&self) -> i64 {
        self.hour as i64 * 3600 + self.minute as i64 * 60 + self.second as i64
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(t: NaiveTime) -> Self {
        Self::new(t.hour(), t.minute(), t.second())
    }
}

/// Fully resolved lighting configuration for one aquarium (or the default)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LightingConfig {
    #[serde(rename = "sunRiseTime")]
    #[validate(nested)]
    pub sunrise_time: ClockTime,
    #[serde(rename = "sunDuration")]
    #[validate(nested)]
    pub duration: ClockTime,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub high_light_ratio: f64,
    #[validate(range(min = 30.0, max = 100.0))]
    pub max_intensity: f64,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            sunrise_time: ClockTime::new(6, 0, 0),
            duration: ClockTime::new(16, 0, 0),
            high_light_ratio: 1.0 / 3.0,
            max_intensity: 100.0,
        }
    }
}

impl LightingConfig {
    pub fn sunrise_seconds(&self) -> i64 {
        self.sunrise_time.seconds_of_day()
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration.seconds_of_day()
    }

    /// Sunset as seconds after midnight of the sunrise day (may exceed 24h)
    pub fn sunset_seconds(&self) -> i64 {
        self.sunrise_seconds() + self.duration_seconds()
    }

    /// Sunset as a wall-clock time, wrapped past midnight
    pub fn sunset_time(&self) -> ClockTime {
        let s = self.sunset_seconds().rem_euclid(SECONDS_PER_DAY);
        ClockTime::new((s / 3600) as u32, ((s % 3600) / 60) as u32, (s % 60) as u32)
    }

    /// Range checks plus the zero-duration rule
    pub fn validate_config(&self) -> Result<(), SimulationError> {
        self.validate()?;
        if self.duration_seconds() <= 0 {
            return Err(SimulationError::InvalidConfig(
                "sunDuration must be longer than zero seconds".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stored per-aquarium configuration; every field falls back to the default
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightingConfigPatch {
    #[serde(rename = "sunRiseTime", default, skip_serializing_if = "Option::is_none")]
    pub sunrise_time: Option<ClockTime>,
    #[serde(rename = "sunDuration", default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_light_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_intensity: Option<f64>,
}

impl LightingConfigPatch {
    /// Merge onto `defaults` and validate the result
    pub fn resolve(&self, defaults: &LightingConfig) -> Result<LightingConfig, SimulationError> {
        let cfg = LightingConfig {
            sunrise_time: self.sunrise_time.unwrap_or(defaults.sunrise_time),
            duration: self.duration.unwrap_or(defaults.duration),
            high_light_ratio: self.high_light_ratio.unwrap_or(defaults.high_light_ratio),
            max_intensity: self.max_intensity.unwrap_or(defaults.max_intensity),
        };
        cfg.validate_config()?;
        Ok(cfg)
    }
}

impl From<LightingConfig> for LightingConfigPatch {
    fn from(cfg: LightingConfig) -> Self {
        Self {
            sunrise_time: Some(cfg.sunrise_time),
            duration: Some(cfg.duration),
            high_light_ratio: Some(cfg.high_light_ratio),
            max_intensity: Some(cfg.max_intensity),
        }
    }
}
