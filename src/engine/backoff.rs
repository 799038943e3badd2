// src/engine/backoff.rs

//! Restart backoff driven by how long the previous run took.
//!
//! A run that ends within [`WORK_THRESHOLD`] is taken to mean the program
//! started, found nothing to do and exited. Each such idle run in a row adds
//! one more `min_restart_delay` to the pause, up to `max_restart_delay`. Any
//! run longer than the threshold resets the count.

use std::time::Duration;

use crate::config::FleetConfig;

/// Runs at or below this length count as idle.
pub const WORK_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Per-worker backoff history. Never shared between workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerContext {
    pub consecutive_idle_cycles: u32,
}

impl WorkerContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Linear, capped restart backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl BackoffPolicy {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
        }
    }

    pub fn from_config(cfg: &FleetConfig) -> Self {
        Self::new(cfg.min_restart_delay(), cfg.max_restart_delay())
    }

    /// `min(min_delay * (idle_cycles + 1), max_delay)`.
    pub fn delay_for(&self, idle_cycles: u32) -> Duration {
        self.min_delay
            .saturating_mul(idle_cycles.saturating_add(1))
            .min(self.max_delay)
    }

    /// Update `ctx` from the last run and return the delay before the next
    /// launch.
    pub fn next_delay(&self, ctx: &mut WorkerContext, realized: Duration) -> Duration {
        ctx.consecutive_idle_cycles = next_idle_cycles(ctx.consecutive_idle_cycles, realized);
        self.delay_for(ctx.consecutive_idle_cycles)
    }
}

/// Whether a run of this length did real work.
pub fn did_work(realized: Duration) -> bool {
    realized > WORK_THRESHOLD
}

/// Idle counter after a run of length `realized`.
pub fn next_idle_cycles(previous: u32, realized: Duration) -> u32 {
    if did_work(realized) {
        0
    } else {
        previous.saturating_add(1)
    }
}
