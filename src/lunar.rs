use std::f64::consts::PI;
use std::fmt;

use chrono::{DateTime, Offset, TimeZone};
use serde::{Deserialize, Serialize};

/// Mean synodic month in days.
pub const SYNODIC_MONTH: f64 = 29.530_587_705_76;
/// Julian date of a reference new moon (2000-01-06 14:24 UT).
pub const REFERENCE_NEW_MOON_JD: f64 = 2_451_550.1;
/// Julian date of the Unix epoch.
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

const MS_PER_DAY: f64 = 86_400_000.0;
const MINUTES_PER_DAY: f64 = 1_440.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaxWane {
    Waxing,
    Waning,
}

impl fmt::Display for WaxWane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaxWane::Waxing => "Waxing",
            WaxWane::Waning => "Waning",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LunarPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl LunarPhase {
    /// In cycle order starting from new moon.
    pub const ALL: [LunarPhase; 8] = [
        LunarPhase::NewMoon,
        LunarPhase::WaxingCrescent,
        LunarPhase::FirstQuarter,
        LunarPhase::WaxingGibbous,
        LunarPhase::FullMoon,
        LunarPhase::WaningGibbous,
        LunarPhase::LastQuarter,
        LunarPhase::WaningCrescent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LunarPhase::NewMoon => "New Moon",
            LunarPhase::WaxingCrescent => "Waxing Crescent",
            LunarPhase::FirstQuarter => "First Quarter",
            LunarPhase::WaxingGibbous => "Waxing Gibbous",
            LunarPhase::FullMoon => "Full Moon",
            LunarPhase::WaningGibbous => "Waning Gibbous",
            LunarPhase::LastQuarter => "Last Quarter",
            LunarPhase::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for LunarPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Local wall-clock time of `at` expressed as a Julian date, so the lunar age
/// follows the local calendar day.
pub fn julian_date<Tz: TimeZone>(at: &DateTime<Tz>) -> f64 {
    // minutes behind UTC, positive west of Greenwich
    let offset_minutes = -(at.offset().fix().local_minus_utc() as f64) / 60.0;
    at.timestamp_millis() as f64 / MS_PER_DAY - offset_minutes / MINUTES_PER_DAY + UNIX_EPOCH_JD
}

/// Days since the most recent mean new moon, in `[0, SYNODIC_MONTH)`.
pub fn age_days<Tz: TimeZone>(at: &DateTime<Tz>) -> f64 {
    age_from_julian_date(julian_date(at))
}

pub fn age_from_julian_date(jd: f64) -> f64 {
    (jd - REFERENCE_NEW_MOON_JD).rem_euclid(SYNODIC_MONTH)
}

/// Illuminated fraction as a whole percentage: 0 at new moon, 100 at full.
pub fn illumination_percent(age: f64) -> u8 {
    let degrees = age / SYNODIC_MONTH * 360.0 + 180.0;
    (50.0 + 50.0 * (degrees * PI / 180.0).cos()).round().clamp(0.0, 100.0) as u8
}

pub fn wax_wane(age: f64) -> WaxWane {
    if age < SYNODIC_MONTH / 2.0 {
        WaxWane::Waxing
    } else {
        WaxWane::Waning
    }
}

/// The cycle is cut into 16 bins. New moon straddles the wrap point, so it
/// owns the first and the last bin; every other phase owns two in a row.
pub fn phase(age: f64) -> LunarPhase {
    let bin = ((age / SYNODIC_MONTH) * 16.0).floor().clamp(0.0, 15.0) as usize;
    LunarPhase::ALL[((bin + 1) / 2) % 8]
}

// ---------- LUNAR INFO ----------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunarInfo {
    pub age_days: f64,
    pub illumination_percent: u8,
    pub wax_wane: WaxWane,
    pub phase: LunarPhase,
}

impl LunarInfo {
    pub fn from_age(age: f64) -> Self {
        Self {
            age_days: age,
            illumination_percent: illumination_percent(age),
            wax_wane: wax_wane(age),
            phase: phase(age),
        }
    }

    pub fn at<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self::from_age(age_days(at))
    }
}
