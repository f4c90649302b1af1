//! # Daylight Simulation
//!
//! Pure functions that turn a wall-clock time and a [`LightingConfig`]
//! into light output for an aquarium.
//!
//! ## Components
//!
//! - **Curve**: cubic sunrise ramp, parabolic midday plateau, cubic sunset ramp
//! - **Color**: RGBW mix, warm on the ramps and neutral at midday
//! - **Phase**: night/sunrise/day/sunset label with progress percentage
//! - **Engine**: composes the above per instant and samples whole days
//!
//! ## Usage
//!
//! ```rust
//! use aquarium_daylight::domain::LightingConfig;
//! use aquarium_daylight::simulation::{simulate, TimeOfDay};
//! use chrono::NaiveTime;
//!
//! let noon = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
//! let sun = simulate(noon, &LightingConfig::default());
//!
//! assert!(sun.is_on);
//! assert_eq!(sun.time_of_day, TimeOfDay::Day);
//! ```
//!
//! [`LightingConfig`]: crate::domain::LightingConfig

pub mod color;
pub mod curve;
pub mod engine;
pub mod phase;

pub use color::Rgbw;
pub use curve::{brightness_factor, DaySegments};
pub use engine::{
    distribution, simulate, simulate_checked, DistributionPoint, LegacySunPayload,
    SimulationResult,
};
pub use phase::{classify, Phase, TimeOfDay, TRANSITION_SECS};
