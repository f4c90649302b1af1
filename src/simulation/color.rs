use serde::{Deserialize, Serialize};

use super::curve::{to_channel, DaySegments};

/// Four-channel color for addressable fixtures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgbw {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
}

// Warm cast applied on the sunrise and sunset ramps
const WARM_GREEN: f64 = 200.0 / 255.0;
const WARM_BLUE: f64 = 50.0 / 255.0;

/// Derive RGBW from the brightness factor. Ramps get a warm orange cast,
/// the midday plateau is neutral. Red never drops below 1 so a light that
/// is on still shows a faint tint.
pub fn mix(brightness_factor: u8, now_sec: i64, segments: &DaySegments) -> Rgbw {
    let f = brightness_factor as f64;
    let (red, green, blue) = if segments.is_ramp(now_sec as f64) {
        (f, f * WARM_GREEN, f * WARM_BLUE)
    } else {
        (f, f, f)
    };

    Rgbw {
        red: to_channel(red).max(1),
        green: to_channel(green),
        blue: to_channel(blue),
        white: to_channel(f),
    }
}
