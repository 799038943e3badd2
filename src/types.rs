// src/types.rs

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;

/// A time of day as written in the config (`"HH:MM"` or `"HH:MM:SS"`).
///
/// Midnight doubles as "unset": a window whose start and end are both
/// midnight places no restriction on launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(NaiveTime::MIN);

    pub fn new(time: NaiveTime) -> Self {
        TimeOfDay(time)
    }

    /// Build from hour/minute/second, returning `None` when out of range.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, second).map(TimeOfDay)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }

    pub fn is_midnight(&self) -> bool {
        self.0 == NaiveTime::MIN
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(TimeOfDay)
            .map_err(|_| format!("invalid time of day '{s}' (expected \"HH:MM\" or \"HH:MM:SS\")"))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

/// Daily interval during which new launches are allowed.
///
/// `start > end` means the window wraps past midnight (e.g. 22:00 → 06:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl LaunchWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for LaunchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}
