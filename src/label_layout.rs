//! Where the sun-event labels go.
//!
//! Sunrise and sunset drift by roughly two hours over a year, so a fixed
//! label position would collide with the dial or with the twilight label
//! around the solstices. Each event pair picks a slot pair from the band its
//! angle falls in.

use crate::time_angle::DialAngle;
use crate::twilight::TWILIGHT_DEGREES;

const SIX_AM: f64 = 90.0;
const SIX_PM: f64 = 270.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Morning events, text grows to the right of `x`.
    Left,
    /// Evening events, text ends at `x`.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSlot {
    pub x: f64,
    pub y: f64,
    pub column: Column,
}

const LEFT_X: f64 = 120.0;
const RIGHT_X: f64 = 1800.0;

/// Left column holds slots 0-3, right column 4-8, top to bottom. Slot 8 is
/// the overflow row for late summer sunsets.
pub const LABEL_SLOTS: [LabelSlot; 9] = [
    LabelSlot { x: LEFT_X, y: 330.0, column: Column::Left },
    LabelSlot { x: LEFT_X, y: 470.0, column: Column::Left },
    LabelSlot { x: LEFT_X, y: 610.0, column: Column::Left },
    LabelSlot { x: LEFT_X, y: 750.0, column: Column::Left },
    LabelSlot { x: RIGHT_X, y: 290.0, column: Column::Right },
    LabelSlot { x: RIGHT_X, y: 420.0, column: Column::Right },
    LabelSlot { x: RIGHT_X, y: 550.0, column: Column::Right },
    LabelSlot { x: RIGHT_X, y: 680.0, column: Column::Right },
    LabelSlot { x: RIGHT_X, y: 810.0, column: Column::Right },
];

/// Slot indices for one event and its twilight companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPair {
    pub event: usize,
    pub twilight: usize,
}

impl SlotPair {
    const fn new(event: usize, twilight: usize) -> Self {
        Self { event, twilight }
    }

    pub fn event_slot(&self) -> LabelSlot {
        LABEL_SLOTS[self.event]
    }

    pub fn twilight_slot(&self) -> LabelSlot {
        LABEL_SLOTS[self.twilight]
    }
}

/// Sunrise sits above first light: first light is closer to midnight, which
/// is the bottom of the dial.
pub fn sunrise_slots(sunrise: DialAngle) -> SlotPair {
    let angle = sunrise.degrees();
    if angle <= SIX_AM {
        SlotPair::new(2, 3)
    } else if angle < SIX_AM + TWILIGHT_DEGREES {
        SlotPair::new(1, 2)
    } else {
        SlotPair::new(0, 1)
    }
}

/// Sunset sits above last light.
pub fn sunset_slots(sunset: DialAngle) -> SlotPair {
    let angle = sunset.degrees();
    if angle < SIX_PM - TWILIGHT_DEGREES {
        SlotPair::new(4, 5)
    } else if angle < SIX_PM {
        SlotPair::new(5, 6)
    } else if angle < SIX_PM + TWILIGHT_DEGREES {
        SlotPair::new(6, 7)
    } else {
        SlotPair::new(7, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_angle::to_dial_angle;

    #[test]
    fn test_slot_columns() {
        assert!(LABEL_SLOTS[..4].iter().all(|s| s.column == Column::Left));
        assert!(LABEL_SLOTS[4..].iter().all(|s| s.column == Column::Right));
        // rows go top to bottom inside each column
        assert!(LABEL_SLOTS[..4].windows(2).all(|w| w[0].y < w[1].y));
        assert!(LABEL_SLOTS[4..].windows(2).all(|w| w[0].y < w[1].y));
    }

    #[test]
    fn test_sunrise_bands() {
        assert_eq!(sunrise_slots(to_dial_angle("05:10")), SlotPair::new(2, 3));
        assert_eq!(sunrise_slots(to_dial_angle("06:00")), SlotPair::new(2, 3));
        assert_eq!(sunrise_slots(to_dial_angle("06:20")), SlotPair::new(1, 2));
        assert_eq!(sunrise_slots(to_dial_angle("07:35")), SlotPair::new(1, 2));
        assert_eq!(sunrise_slots(to_dial_angle("07:36")), SlotPair::new(0, 1));
        assert_eq!(sunrise_slots(to_dial_angle("08:10")), SlotPair::new(0, 1));
    }

    #[test]
    fn test_sunset_bands() {
        assert_eq!(sunset_slots(to_dial_angle("16:10")), SlotPair::new(4, 5));
        assert_eq!(sunset_slots(to_dial_angle("16:24")), SlotPair::new(5, 6));
        assert_eq!(sunset_slots(to_dial_angle("17:59")), SlotPair::new(5, 6));
        assert_eq!(sunset_slots(to_dial_angle("18:00")), SlotPair::new(6, 7));
        assert_eq!(sunset_slots(to_dial_angle("19:04")), SlotPair::new(6, 7));
        assert_eq!(sunset_slots(to_dial_angle("20:45")), SlotPair::new(7, 8));
    }

    #[test]
    fn test_event_label_above_twilight_label() {
        for time in ["04:50", "06:45", "08:05"] {
            let pair = sunrise_slots(to_dial_angle(time));
            assert!(pair.event_slot().y < pair.twilight_slot().y);
        }
        for time in ["16:00", "17:30", "18:40", "21:00"] {
            let pair = sunset_slots(to_dial_angle(time));
            assert!(pair.event_slot().y < pair.twilight_slot().y);
        }
    }
}
