#![allow(dead_code)]

pub use procfleet_test_utils::builders;
pub use procfleet_test_utils::{capture_logs, drain_events, init_tracing, with_timeout};

use chrono::{NaiveDate, NaiveDateTime};

/// Local timestamp on a fixed test day.
pub fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 10)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .expect("valid test timestamp")
}
