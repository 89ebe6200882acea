//! # Stick Angle Estimator
//!
//! Converts raw 12-bit stick samples into a direction in whole degrees.
//!
//! The angle follows the `atan2(dy, dx)` convention: 0° points along +X,
//! 90° along +Y, and the result is normalized into `[0, 360)`. Samples whose
//! displacement from [`STICK_CENTER`] is within [`STICK_DEADZONE_RADIUS`] read
//! as neutral, which suppresses drift while the stick is at rest.

use super::protocol::{STICK_CENTER, STICK_DEADZONE_RADIUS};

/// Raw stick axes as unpacked from an input report (0-4095 each)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawStick {
    pub x: u16,
    pub y: u16,
}

impl RawStick {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Unpack two 12-bit axes from three bytes
    ///
    /// ```text
    /// x = b0 | (b1 & 0x0F) << 8
    /// y = (b1 >> 4) | b2 << 4
    /// ```
    pub fn unpack(bytes: [u8; 3]) -> Self {
        let x = bytes[0] as u16 | ((bytes[1] as u16 & 0x0F) << 8);
        let y = (bytes[1] as u16 >> 4) | ((bytes[2] as u16) << 4);
        Self { x, y }
    }

    /// Displacement from center as (dx, dy)
    pub fn displacement(&self) -> (f64, f64) {
        (
            self.x as f64 - STICK_CENTER as f64,
            self.y as f64 - STICK_CENTER as f64,
        )
    }

    /// Distance from center
    pub fn magnitude(&self) -> f64 {
        let (dx, dy) = self.displacement();
        dx.hypot(dy)
    }
}

/// Result of estimating a stick direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickAngle {
    /// Inside the deadzone
    Neutral,
    /// Direction in whole degrees, 0-359
    Degrees(u16),
}

impl StickAngle {
    /// Degrees, or `None` when neutral
    pub fn degrees(self) -> Option<u16> {
        match self {
            StickAngle::Neutral => None,
            StickAngle::Degrees(deg) => Some(deg),
        }
    }
}

/// Estimate the direction of a raw stick sample
///
/// # Examples
///
/// ```
/// use joycon_bridge::joycon::stick::{estimate_angle, RawStick, StickAngle};
///
/// assert_eq!(estimate_angle(RawStick::new(2048, 2048)), StickAngle::Neutral);
/// assert_eq!(estimate_angle(RawStick::new(3048, 2048)), StickAngle::Degrees(0));
/// assert_eq!(estimate_angle(RawStick::new(2048, 1048)), StickAngle::Degrees(270));
/// ```
pub fn estimate_angle(raw: RawStick) -> StickAngle {
    if raw.magnitude() <= STICK_DEADZONE_RADIUS {
        return StickAngle::Neutral;
    }

    let (dx, dy) = raw.displacement();
    let degrees = dy.atan2(dx).to_degrees().rem_euclid(360.0).round() as u16;

    // 359.5 and above round up to 360
    StickAngle::Degrees(degrees % 360)
}
