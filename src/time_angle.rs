//! Clock times on the 24-hour dial.
//!
//! 0° is midnight drawn straight down, 180° is noon straight up, and angles
//! grow clockwise at 15° per hour (0.25° per minute).

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TimeFormatError;

pub const DEGREES_PER_HOUR: f64 = 15.0;
pub const DEGREES_PER_MINUTE: f64 = 0.25;
pub const FULL_TURN: f64 = 360.0;

// ---------- CLOCK TIME ----------

/// Hour and minute of a provider time string such as `"06:20"` or
/// `"19:04:33.120"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, TimeFormatError> {
        if hour > 23 || minute > 59 {
            return Err(TimeFormatError::InvalidTimeFormat(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    /// Strict parser. Seconds and fractional seconds are accepted but ignored.
    pub fn parse(input: &str) -> Result<Self, TimeFormatError> {
        let invalid = || TimeFormatError::InvalidTimeFormat(input.to_string());

        let mut fields = input.trim().split(':');
        let hour = fields.next().ok_or_else(invalid)?;
        let minute = fields.next().ok_or_else(invalid)?;

        let hour: u8 = parse_field(hour).ok_or_else(invalid)?;
        let minute: u8 = parse_field(minute).ok_or_else(invalid)?;

        Self::new(hour, minute).map_err(|_| invalid())
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    pub fn dial_angle(&self) -> DialAngle {
        DialAngle(self.hour as f64 * DEGREES_PER_HOUR + self.minute as f64 * DEGREES_PER_MINUTE)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

fn parse_field(field: &str) -> Option<u8> {
    let field = field.trim();
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

// ---------- DIAL ANGLE ----------

/// Position on the dial in degrees. Never negative; may exceed 360 while an
/// overnight moon window is being kept in forward order.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct DialAngle(f64);

impl DialAngle {
    pub const MIDNIGHT: DialAngle = DialAngle(0.0);
    pub const NEXT_MIDNIGHT: DialAngle = DialAngle(FULL_TURN);
    pub const NOON: DialAngle = DialAngle(180.0);

    pub fn from_degrees(degrees: f64) -> Self {
        DialAngle(degrees.max(0.0))
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    /// Same clock position one day later.
    pub fn next_day(self) -> Self {
        DialAngle(self.0 + FULL_TURN)
    }

}

// ---------- CONVERSIONS ----------

/// Dial angle for a provider time string. Malformed input is logged and
/// mapped to midnight so rendering can carry on.
pub fn to_dial_angle(time: &str) -> DialAngle {
    match ClockTime::parse(time) {
        Ok(clock) => clock.dial_angle(),
        Err(e) => {
            warn!(target: "dial_time", "{e}; using midnight");
            DialAngle::MIDNIGHT
        }
    }
}

/// Rotation in radians for the surface's arc primitive, whose zero points
/// along +x and grows clockwise. The surface reference sits 90° away from
/// "up" and the dial puts midnight at the bottom, hence `+ 180 - 90`.
pub fn to_render_rotation(angle: DialAngle) -> f64 {
    let mut degrees = (angle.degrees() + 180.0 - 90.0) % FULL_TURN;
    if degrees < 0.0 {
        degrees += FULL_TURN;
    }
    degrees * PI / 180.0
}

/// `"H:MM AM"` / `"H:MM PM"`. Empty string for malformed input.
pub fn format_clock_12h(time: &str) -> String {
    match ClockTime::parse(time) {
        Ok(clock) => {
            let suffix = if clock.hour < 12 { "AM" } else { "PM" };
            let hour = match clock.hour % 12 {
                0 => 12,
                h => h,
            };
            format!("{}:{:02} {}", hour, clock.minute, suffix)
        }
        Err(e) => {
            warn!(target: "dial_time", "{e}; leaving label empty");
            String::new()
        }
    }
}
