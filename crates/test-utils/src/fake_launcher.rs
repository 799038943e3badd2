use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use procfleet::errors::{FleetError, Result};
use procfleet::exec::{LaunchRequest, ProcessLauncher, RunEnd, RunResult};
use procfleet::window::Clock;

/// What a fake run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeRun {
    /// Run for this long, then exit 0 (or time out if longer than the limit).
    Exit(Duration),
    /// Never exit on its own; ends by timeout or cancellation.
    Hang,
    /// Fail to start, as if the executable had disappeared.
    FailToStart,
}

type Script = dyn Fn(usize, usize) -> FakeRun + Send + Sync;

/// A fake launcher that:
/// - asks a script what each launch should do, given `(worker, attempt)`
///   with `attempt` counting from 0 per worker
/// - records every launch
/// - sleeps with `tokio::time`, so tests can run with paused time.
pub struct ScriptedLauncher {
    script: Box<Script>,
    launches: Arc<Mutex<Vec<usize>>>,
    attempts: Mutex<HashMap<usize, usize>>,
}

impl ScriptedLauncher {
    pub fn new(script: impl Fn(usize, usize) -> FakeRun + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            launches: Arc::new(Mutex::new(Vec::new())),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Every launch of every worker does the same thing.
    pub fn always(run: FakeRun) -> Self {
        Self::new(move |_, _| run)
    }

    /// Worker ids in launch order.
    pub fn launches(&self) -> Vec<usize> {
        self.launches.lock().unwrap().clone()
    }

    pub fn launch_count(&self, worker: usize) -> usize {
        self.launches
            .lock()
            .unwrap()
            .iter()
            .filter(|&&w| w == worker)
            .count()
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn launch<'a>(
        &'a self,
        request: &'a LaunchRequest,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<RunResult>> + Send + 'a>> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let slot = attempts.entry(request.worker).or_insert(0);
            let current = *slot;
            *slot += 1;
            current
        };
        let run = (self.script)(request.worker, attempt);
        self.launches.lock().unwrap().push(request.worker);

        Box::pin(async move {
            let limit = request.max_run_duration;
            let started = Instant::now();
            let started_at = Local::now();

            let (end, realized) = match run {
                FakeRun::FailToStart => {
                    return Err(FleetError::ExecutableFailed {
                        path: request.executable.clone(),
                        source: io::Error::new(io::ErrorKind::NotFound, "fake launch failure"),
                    });
                }
                FakeRun::Exit(d) => {
                    tokio::select! {
                        _ = cancel.cancelled() => (RunEnd::Cancelled, started.elapsed()),
                        _ = sleep(d.min(limit)) => {
                            if d > limit {
                                (RunEnd::TimedOut, limit)
                            } else {
                                (RunEnd::Exited(Some(0)), d)
                            }
                        }
                    }
                }
                FakeRun::Hang => {
                    tokio::select! {
                        _ = cancel.cancelled() => (RunEnd::Cancelled, started.elapsed()),
                        _ = sleep(limit) => (RunEnd::TimedOut, limit),
                    }
                }
            };

            Ok(RunResult {
                pid: Some(10_000 + request.worker as u32),
                started_at,
                ended_at: Local::now(),
                end,
                realized_duration: realized,
            })
        })
    }
}

/// A clock stuck at one instant (settable).
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}
