// src/engine/mod.rs

//! Supervision engine for procfleet.
//!
//! This module ties together:
//! - the restart backoff policy ([`backoff`])
//! - the per-instance worker loop ([`worker`])
//! - the fleet orchestrator that runs all workers with a shared
//!   cancellation token ([`fleet`])
//!
//! Workers can report what they are doing as [`FleetEvent`]s; the binary
//! does not listen, tests do.

use std::time::Duration;

use crate::exec::RunResult;

/// Where a worker is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for the daily launch window to open.
    WaitingForWindow,
    /// Launching the process and waiting for it to exit or time out.
    Running,
    /// Sleeping between runs.
    Backoff,
    /// Stopped because the fleet was cancelled.
    Cancelled,
    /// Stopped because this worker's launch failed.
    FatalStopped,
}

/// Why a worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    Fatal,
}

/// Events published by workers.
#[derive(Debug, Clone)]
pub enum FleetEvent {
    StateChanged {
        worker: usize,
        state: WorkerState,
    },
    /// A run ended (normally or by timeout) and the next delay is known.
    RunFinished {
        worker: usize,
        result: RunResult,
        idle_cycles: u32,
        next_delay: Duration,
    },
    Stopped {
        worker: usize,
        reason: StopReason,
    },
}

impl FleetEvent {
    pub fn worker(&self) -> usize {
        match self {
            FleetEvent::StateChanged { worker, .. }
            | FleetEvent::RunFinished { worker, .. }
            | FleetEvent::Stopped { worker, .. } => *worker,
        }
    }
}

pub mod backoff;
pub mod fleet;
pub mod worker;

pub use backoff::{BackoffPolicy, WorkerContext, WORK_THRESHOLD};
pub use fleet::Fleet;
pub use worker::Worker;
