// src/exec/backend.rs

//! Pluggable launcher abstraction.
//!
//! Workers talk to a `ProcessLauncher` instead of spawning processes
//! themselves. This makes it easy to swap in a fake launcher in tests while
//! keeping the production implementation in [`command`](super::command).

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;

use crate::config::FleetConfig;
use crate::errors::Result;

/// Everything needed to start one instance.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Index of the worker issuing the launch (for logs).
    pub worker: usize,
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Hard ceiling; the process is killed once this elapses.
    pub max_run_duration: Duration,
}

impl LaunchRequest {
    pub fn from_config(worker: usize, cfg: &FleetConfig) -> Self {
        Self {
            worker,
            executable: cfg.executable_path().to_path_buf(),
            arguments: cfg.arguments().to_vec(),
            working_dir: cfg.working_dir().map(Path::to_path_buf),
            max_run_duration: cfg.max_run_duration(),
        }
    }
}

/// How a run came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The process exited on its own. `None` when it was ended by a signal.
    Exited(Option<i32>),
    /// `max_run_duration` elapsed and the process was killed.
    TimedOut,
    /// The fleet was cancelled and the process was killed.
    Cancelled,
}

/// Outcome of a single launch.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub pid: Option<u32>,
    pub started_at: DateTime<Local>,
    /// Exit time, or the time the process was killed.
    pub ended_at: DateTime<Local>,
    pub end: RunEnd,
    /// Monotonic time between spawn and exit/kill.
    pub realized_duration: Duration,
}

impl RunResult {
    pub fn was_killed(&self) -> bool {
        matches!(self.end, RunEnd::TimedOut | RunEnd::Cancelled)
    }

    pub fn was_cancelled(&self) -> bool {
        self.end == RunEnd::Cancelled
    }

    /// Run length in minutes, as printed in the logs.
    pub fn minutes(&self) -> f64 {
        self.realized_duration.as_secs_f64() / 60.0
    }
}

/// Trait abstracting how one instance is run to completion.
///
/// Production code uses [`CommandLauncher`](super::CommandLauncher); tests
/// can provide implementations that don't spawn real processes.
///
/// An `Err` means the process could not be started at all and is fatal for
/// the fleet. Timeouts and cancellation are reported through [`RunEnd`].
pub trait ProcessLauncher: Send + Sync {
    fn launch<'a>(
        &'a self,
        request: &'a LaunchRequest,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<RunResult>> + Send + 'a>>;
}
