//! Moonrise and moonset as one span on the dial.
//!
//! A moon that rises today and sets after midnight keeps a contiguous span.

use crate::time_angle::{to_dial_angle, DialAngle};

/// Moon-up span on the dial. `set` is never numerically before `rise`: a moon
/// that sets after the next midnight gets 360° added to its set angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonWindow {
    pub rise: DialAngle,
    pub set: DialAngle,
}

impl MoonWindow {
    /// `None` means the provider reported no such event today.
    pub fn resolve(moonrise: Option<&str>, moonset: Option<&str>) -> Self {
        let rise = moonrise.map_or(DialAngle::MIDNIGHT, to_dial_angle);
        let set = moonset.map_or(DialAngle::NEXT_MIDNIGHT, to_dial_angle);
        Self::from_angles(rise, set)
    }

    pub fn from_angles(rise: DialAngle, set: DialAngle) -> Self {
        let set = if set < rise { set.next_day() } else { set };
        Self { rise, set }
    }

    pub fn span_degrees(&self) -> f64 {
        self.set.degrees() - self.rise.degrees()
    }

    /// Whether a clock position falls inside the window, counting the copy
    /// of that position one day later.
    pub fn contains(&self, angle: DialAngle) -> bool {
        let inside = |a: DialAngle| self.rise <= a && a <= self.set;
        inside(angle) || inside(angle.next_day())
    }
}
