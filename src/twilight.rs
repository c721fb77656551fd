use tracing::warn;

use crate::time_angle::{to_dial_angle, ClockTime, DialAngle};

/// Twilight margin on the dial: 96 minutes.
pub const TWILIGHT_DEGREES: f64 = 24.0;
pub const TWILIGHT_MINUTES: i32 = 96;

/// First light (`is_morning`) before sunrise or last light after sunset,
/// shifted by 96 minutes with minute/hour carry. Hours wrap around midnight.
pub fn compute_twilight(time: &str, is_morning: bool) -> String {
    let clock = match ClockTime::parse(time) {
        Ok(clock) => clock,
        Err(e) => {
            warn!(target: "dial_time", "{e}; twilight left at event time");
            return time.to_string();
        }
    };

    let mut hour = clock.hour as i32;
    let mut minute = clock.minute as i32;

    if is_morning {
        if minute >= 36 {
            minute -= 36;
            hour -= 1;
        } else {
            minute += 24;
            hour -= 2;
        }
    } else if minute < 24 {
        minute += 36;
        hour += 1;
    } else {
        minute -= 24;
        hour += 2;
    }

    format!("{:02}:{:02}", hour.rem_euclid(24), minute)
}

// ---------- TWILIGHT WINDOW ----------

/// Dial span between first light and sunrise, or sunset and last light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwilightWindow {
    pub start: DialAngle,
    pub end: DialAngle,
}

impl TwilightWindow {
    pub fn morning(sunrise: &str) -> Self {
        Self {
            start: to_dial_angle(&compute_twilight(sunrise, true)),
            end: to_dial_angle(sunrise),
        }
    }

    pub fn evening(sunset: &str) -> Self {
        Self {
            start: to_dial_angle(sunset),
            end: to_dial_angle(&compute_twilight(sunset, false)),
        }
    }
}
