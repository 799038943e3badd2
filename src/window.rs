// src/window.rs

//! Daily launch window gate.
//!
//! [`time_until_open`] is the pure calculation; [`wait_for_window`] is the
//! async wrapper that logs the wake time and sleeps (or returns early if the
//! fleet is cancelled).

use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::types::LaunchWindow;

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The machine's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// How the window gate released the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Already inside the window (or no window configured).
    Open,
    /// Slept until the window opened.
    Waited(Duration),
    /// The fleet was cancelled during the wait.
    Cancelled,
}

/// Time to wait from `now` until launches are allowed again.
///
/// Returns `Duration::ZERO` when `now` is inside the window. The end of the
/// window is inclusive. For a window that wraps midnight the opening edge is
/// taken from the previous day, so e.g. 22:00 → 06:00 at 03:00 is open.
pub fn time_until_open(window: &LaunchWindow, now: NaiveDateTime) -> Duration {
    let today = now.date();
    let mut earlier = today.and_time(window.start.as_naive());
    let later = today.and_time(window.end.as_naive());
    if window.wraps_midnight() {
        earlier -= TimeDelta::days(1);
    }

    let wait = if now < earlier {
        earlier - now
    } else if now > later {
        (earlier + TimeDelta::days(1)) - now
    } else {
        TimeDelta::zero()
    };

    // A wrapped window seen late in the evening yields a negative delta: the
    // next opening edge has already passed today, so we are inside.
    wait.to_std().unwrap_or(Duration::ZERO)
}

/// `now + wait`, saturating at `now` if the sum is not representable.
pub fn wake_time(now: NaiveDateTime, wait: Duration) -> NaiveDateTime {
    TimeDelta::from_std(wait)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(now)
}

/// Block until the window is open.
///
/// Does not re-check after waking; the window is assumed stable across a
/// single wait.
pub async fn wait_for_window(
    window: Option<&LaunchWindow>,
    clock: &dyn Clock,
    cancel: &CancellationToken,
    worker: usize,
) -> GateOutcome {
    let Some(window) = window else {
        return GateOutcome::Open;
    };

    let now = clock.now();
    let wait = time_until_open(window, now);
    if wait.is_zero() {
        return GateOutcome::Open;
    }

    let wake_at = wake_time(now, wait);
    info!(
        worker,
        window = %window,
        wake_at = %wake_at.format("%Y-%m-%d %H:%M:%S"),
        "outside launch window; sleeping until it opens"
    );

    tokio::select! {
        _ = cancel.cancelled() => GateOutcome::Cancelled,
        _ = sleep(wait) => GateOutcome::Waited(wait),
    }
}
