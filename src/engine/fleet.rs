// src/engine/fleet.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::FleetConfig;
use crate::engine::worker::Worker;
use crate::engine::FleetEvent;
use crate::errors::{FleetError, Result};
use crate::exec::ProcessLauncher;
use crate::window::{Clock, SystemClock};

/// Runs `instance_count` independent workers sharing one cancellation token.
///
/// The first worker that fails cancels the token; the others stop at their
/// next suspension point and the failure is returned from [`Fleet::run`].
pub struct Fleet {
    config: Arc<FleetConfig>,
    launcher: Arc<dyn ProcessLauncher>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedSender<FleetEvent>>,
}

impl fmt::Debug for Fleet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fleet")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Fleet {
    pub fn new(config: FleetConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            config: Arc::new(config),
            launcher,
            clock: Arc::new(SystemClock),
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Forward every worker's events to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<FleetEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Clone of the shared token, so callers (e.g. a Ctrl-C handler) can stop
    /// the fleet from outside.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start all workers and wait for them to finish.
    ///
    /// Workers only finish once the token is cancelled, so this returns
    /// `Ok(())` after an external cancellation and the first worker error
    /// otherwise.
    pub async fn run(self) -> Result<()> {
        let instances = self.config.instance_count();
        let mut workers = JoinSet::new();

        for id in 1..=instances {
            let mut worker = Worker::new(
                id,
                Arc::clone(&self.config),
                Arc::clone(&self.launcher),
                Arc::clone(&self.clock),
                self.cancel.clone(),
            );
            if let Some(tx) = &self.events {
                worker = worker.with_events(tx.clone());
            }
            workers.spawn(worker.run());
        }

        info!(
            instances,
            executable = ?self.config.executable_path(),
            "fleet started"
        );

        let mut first_error: Option<FleetError> = None;
        while let Some(joined) = workers.join_next().await {
            let outcome = joined.unwrap_or_else(|e| Err(FleetError::WorkerPanicked(e.to_string())));

            if let Err(err) = outcome {
                self.cancel.cancel();
                match first_error {
                    None => first_error = Some(err),
                    Some(_) => debug!(error = %err, "additional worker failure after cancellation"),
                }
            }
        }

        match first_error {
            Some(err) => {
                error!(error = %err, fatal = err.is_fatal(), "fleet stopped by worker failure");
                Err(err)
            }
            None => {
                info!("fleet stopped");
                Ok(())
            }
        }
    }
}
