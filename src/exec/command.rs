// src/exec/command.rs

//! Real process launcher built on `tokio::process::Command`.

use std::future::Future;
use std::pin::Pin;

use chrono::Local;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::{FleetError, Result};
use crate::exec::backend::{LaunchRequest, ProcessLauncher, RunEnd, RunResult};

/// Launches the executable directly (no shell), with inherited
/// stdout/stderr, and enforces `max_run_duration`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandLauncher;

impl CommandLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLauncher for CommandLauncher {
    fn launch<'a>(
        &'a self,
        request: &'a LaunchRequest,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<RunResult>> + Send + 'a>> {
        Box::pin(run_instance(request, cancel))
    }
}

/// Run one instance until it exits, times out, or the fleet is cancelled.
///
/// The child is spawned with `kill_on_drop(true)`, so even if this future is
/// dropped mid-wait the process does not outlive it.
pub async fn run_instance(request: &LaunchRequest, cancel: &CancellationToken) -> Result<RunResult> {
    let worker = request.worker;

    let mut cmd = Command::new(&request.executable);
    cmd.args(&request.arguments).kill_on_drop(true);
    if let Some(dir) = &request.working_dir {
        cmd.current_dir(dir);
    }

    let started = Instant::now();
    let started_at = Local::now();
    let mut child = cmd.spawn().map_err(|source| FleetError::ExecutableFailed {
        path: request.executable.clone(),
        source,
    })?;
    let pid = child.id();

    info!(
        worker,
        pid,
        started_at = %started_at.format("%Y-%m-%d %H:%M:%S"),
        "process started"
    );

    let end = tokio::select! {
        status_res = child.wait() => {
            let status = status_res.map_err(|source| FleetError::ExecutableFailed {
                path: request.executable.clone(),
                source,
            })?;
            RunEnd::Exited(status.code())
        }

        _ = sleep(request.max_run_duration) => {
            warn!(
                worker,
                pid,
                max_run_secs = request.max_run_duration.as_secs(),
                "process had to be killed, check for incomplete data"
            );
            terminate(&mut child, worker, pid).await;
            RunEnd::TimedOut
        }

        _ = cancel.cancelled() => {
            info!(worker, pid, "fleet cancelled; killing running process");
            terminate(&mut child, worker, pid).await;
            RunEnd::Cancelled
        }
    };

    let result = RunResult {
        pid,
        started_at,
        ended_at: Local::now(),
        end,
        realized_duration: started.elapsed(),
    };

    info!(
        worker,
        pid,
        ended_at = %result.ended_at.format("%Y-%m-%d %H:%M:%S"),
        mins = %format!("{:.1}", result.minutes()),
        outcome = ?result.end,
        "process ended"
    );

    Ok(result)
}

/// Kill and reap. A failure here is logged, not propagated: the run still
/// needs a result so backoff has a duration to act on.
async fn terminate(child: &mut Child, worker: usize, pid: Option<u32>) {
    if let Err(e) = child.kill().await {
        warn!(
            worker,
            pid,
            error = %e,
            "failed to kill child process; it may still be running"
        );
    }
}
