// src/engine/worker.rs

//! One supervised instance: window gate, run, backoff, forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::FleetConfig;
use crate::engine::backoff::{did_work, BackoffPolicy, WorkerContext};
use crate::engine::{FleetEvent, StopReason, WorkerState};
use crate::errors::Result;
use crate::exec::{LaunchRequest, ProcessLauncher};
use crate::window::{wait_for_window, wake_time, Clock, GateOutcome};

/// Worker loop for a single instance.
///
/// The worker owns its [`WorkerContext`]; everything else is shared
/// read-only with the rest of the fleet, except the cancellation token,
/// which the worker cancels itself if its launch fails.
pub struct Worker {
    id: usize,
    config: Arc<FleetConfig>,
    launcher: Arc<dyn ProcessLauncher>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    backoff: BackoffPolicy,
    ctx: WorkerContext,
    events: Option<mpsc::UnboundedSender<FleetEvent>>,
}

impl Worker {
    pub fn new(
        id: usize,
        config: Arc<FleetConfig>,
        launcher: Arc<dyn ProcessLauncher>,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        let backoff = BackoffPolicy::from_config(&config);
        Self {
            id,
            config,
            launcher,
            clock,
            cancel,
            backoff,
            ctx: WorkerContext::new(),
            events: None,
        }
    }

    /// Publish state changes and run results to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<FleetEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Run until the fleet is cancelled (`Ok`) or the launch fails (`Err`).
    ///
    /// There is no successful terminal state: a healthy worker loops for the
    /// lifetime of the supervisor.
    pub async fn run(mut self) -> Result<()> {
        let request = LaunchRequest::from_config(self.id, &self.config);
        debug!(worker = self.id, executable = ?request.executable, "worker started");

        loop {
            if self.cancel.is_cancelled() {
                return self.stop_cancelled();
            }

            self.enter(WorkerState::WaitingForWindow);
            let window = self.config.window();
            let gate =
                wait_for_window(window.as_ref(), self.clock.as_ref(), &self.cancel, self.id).await;
            if gate == GateOutcome::Cancelled || self.cancel.is_cancelled() {
                return self.stop_cancelled();
            }

            self.enter(WorkerState::Running);
            let result = match self.launcher.launch(&request, &self.cancel).await {
                Ok(result) => result,
                Err(err) => {
                    self.cancel.cancel();
                    error!(
                        worker = self.id,
                        error = %err,
                        "launch failed; cancelling the whole fleet"
                    );
                    self.enter(WorkerState::FatalStopped);
                    self.emit(FleetEvent::Stopped {
                        worker: self.id,
                        reason: StopReason::Fatal,
                    });
                    return Err(err);
                }
            };

            if result.was_cancelled() {
                return self.stop_cancelled();
            }

            let delay = self.backoff.next_delay(&mut self.ctx, result.realized_duration);
            debug!(
                worker = self.id,
                did_work = did_work(result.realized_duration),
                idle_cycles = self.ctx.consecutive_idle_cycles,
                delay_secs = delay.as_secs(),
                "computed restart delay"
            );
            self.emit(FleetEvent::RunFinished {
                worker: self.id,
                result,
                idle_cycles: self.ctx.consecutive_idle_cycles,
                next_delay: delay,
            });

            self.enter(WorkerState::Backoff);
            if !self.sleep_backoff(delay).await {
                return self.stop_cancelled();
            }
        }
    }

    /// Returns `false` if the fleet was cancelled during the sleep.
    async fn sleep_backoff(&self, delay: Duration) -> bool {
        let wake_at = wake_time(self.clock.now(), delay);
        info!(
            worker = self.id,
            wake_at = %wake_at.format("%Y-%m-%d %H:%M:%S"),
            "sleeping before next launch"
        );

        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }

    fn stop_cancelled(&self) -> Result<()> {
        info!(worker = self.id, "fleet cancelled; worker stopping");
        self.enter(WorkerState::Cancelled);
        self.emit(FleetEvent::Stopped {
            worker: self.id,
            reason: StopReason::Cancelled,
        });
        Ok(())
    }

    fn enter(&self, state: WorkerState) {
        debug!(worker = self.id, ?state, "worker state");
        self.emit(FleetEvent::StateChanged {
            worker: self.id,
            state,
        });
    }

    fn emit(&self, event: FleetEvent) {
        if let Some(tx) = &self.events {
            // Observer may have gone away; supervision carries on regardless.
            let _ = tx.send(event);
        }
    }
}
