// tests/fleet_fake_launcher.rs

mod common;
use crate::common::builders::{minutes, FleetConfigBuilder};
use crate::common::{at, drain_events, init_tracing};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use procfleet::engine::{Fleet, FleetEvent, StopReason, WorkerState};
use procfleet::errors::FleetError;
use procfleet::exec::RunEnd;
use procfleet::types::{LaunchWindow, TimeOfDay};
use procfleet_test_utils::fake_launcher::{FakeRun, FixedClock, ScriptedLauncher};

const EXE: &str = "/opt/jobs/bin/importer";

/// Collect `RunFinished` events until every worker in `workers` has at least
/// `per_worker` of them. Maps worker to `(idle_cycles, next_delay)` per run.
async fn collect_runs(
    rx: &mut mpsc::UnboundedReceiver<FleetEvent>,
    workers: &[usize],
    per_worker: usize,
) -> HashMap<usize, Vec<(u32, Duration)>> {
    let mut runs: HashMap<usize, Vec<(u32, Duration)>> = HashMap::new();
    while workers
        .iter()
        .any(|w| runs.get(w).map_or(0, Vec::len) < per_worker)
    {
        match rx.recv().await {
            Some(FleetEvent::RunFinished {
                worker,
                idle_cycles,
                next_delay,
                ..
            }) => runs.entry(worker).or_default().push((idle_cycles, next_delay)),
            Some(_) => {}
            None => panic!("event channel closed early"),
        }
    }
    runs
}

#[tokio::test(start_paused = true)]
async fn three_workers_keep_independent_backoff() {
    init_tracing();

    let cfg = FleetConfigBuilder::new(EXE)
        .instance_count(3)
        .restart_delays(minutes(5), minutes(15))
        .build();

    // 1: always idle, 2: always works, 3: alternates idle/work.
    let launcher = Arc::new(ScriptedLauncher::new(|worker, attempt| match worker {
        1 => FakeRun::Exit(minutes(1)),
        2 => FakeRun::Exit(minutes(10)),
        _ if attempt % 2 == 0 => FakeRun::Exit(minutes(1)),
        _ => FakeRun::Exit(minutes(10)),
    }));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let fleet = Fleet::new(cfg, launcher.clone()).with_events(tx);
    let token = fleet.cancellation_token();
    let handle = tokio::spawn(fleet.run());

    let runs = collect_runs(&mut rx, &[1, 2, 3], 3).await;
    token.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(
        runs[&1][..3],
        [(1, minutes(10)), (2, minutes(15)), (3, minutes(15))]
    );
    assert_eq!(
        runs[&2][..3],
        [(0, minutes(5)), (0, minutes(5)), (0, minutes(5))]
    );
    assert_eq!(
        runs[&3][..3],
        [(1, minutes(10)), (0, minutes(5)), (1, minutes(10))]
    );

    // Exactly three distinct workers were ever launched.
    let mut ids = launcher.launches();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn hung_process_is_killed_at_deadline() {
    init_tracing();

    let cfg = FleetConfigBuilder::new(EXE).max_run(minutes(15)).build();
    let launcher = Arc::new(ScriptedLauncher::always(FakeRun::Hang));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let fleet = Fleet::new(cfg, launcher).with_events(tx);
    let token = fleet.cancellation_token();
    let handle = tokio::spawn(fleet.run());

    let event = loop {
        match rx.recv().await.expect("event") {
            event @ FleetEvent::RunFinished { .. } => break event,
            _ => continue,
        }
    };
    token.cancel();
    handle.await.unwrap().unwrap();

    let FleetEvent::RunFinished {
        result,
        idle_cycles,
        next_delay,
        ..
    } = event
    else {
        unreachable!()
    };
    assert_eq!(result.end, RunEnd::TimedOut);
    assert!(result.was_killed());
    assert!(result.realized_duration >= minutes(15));
    // A full-length run counts as work.
    assert_eq!(idle_cycles, 0);
    assert_eq!(next_delay, minutes(5));
}

#[tokio::test(start_paused = true)]
async fn launch_failure_cancels_the_whole_fleet() {
    init_tracing();

    let cfg = FleetConfigBuilder::new(EXE)
        .instance_count(3)
        .restart_delays(minutes(5), minutes(15))
        .build();

    // Worker 2's second launch fails, as if the executable had been deleted.
    let launcher = Arc::new(ScriptedLauncher::new(|worker, attempt| {
        if worker == 2 && attempt == 1 {
            FakeRun::FailToStart
        } else {
            FakeRun::Exit(minutes(1))
        }
    }));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let fleet = Fleet::new(cfg, launcher.clone()).with_events(tx);
    let token = fleet.cancellation_token();

    let err = fleet.run().await.expect_err("fleet should fail");

    match &err {
        FleetError::ExecutableFailed { path, .. } => assert_eq!(path.to_str(), Some(EXE)),
        other => panic!("Expected ExecutableFailed, got: {:?}", other),
    }
    assert!(err.is_fatal());
    assert!(err.to_string().contains(EXE));
    assert!(token.is_cancelled());

    let stops: HashMap<usize, StopReason> = drain_events(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            FleetEvent::Stopped { worker, reason } => Some((worker, reason)),
            _ => None,
        })
        .collect();
    assert_eq!(stops.len(), 3);
    assert_eq!(stops[&2], StopReason::Fatal);
    assert_eq!(stops[&1], StopReason::Cancelled);
    assert_eq!(stops[&3], StopReason::Cancelled);

    // No worker got past its second launch.
    for worker in [1, 2, 3] {
        assert!(launcher.launch_count(worker) <= 2);
    }
}

#[tokio::test(start_paused = true)]
async fn external_cancel_stops_every_worker_cleanly() {
    init_tracing();

    let cfg = FleetConfigBuilder::new(EXE).instance_count(4).build();
    let launcher = Arc::new(ScriptedLauncher::always(FakeRun::Hang));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let fleet = Fleet::new(cfg, launcher.clone()).with_events(tx);
    let token = fleet.cancellation_token();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(minutes(3)).await;
        canceller.cancel();
    });

    fleet.run().await.unwrap();

    let events = drain_events(&mut rx);
    let cancelled: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            FleetEvent::Stopped {
                worker,
                reason: StopReason::Cancelled,
            } => Some(*worker),
            _ => None,
        })
        .collect();
    assert_eq!(cancelled.len(), 4);
    // Every hung run was cut short by the cancel, so none finished.
    assert!(!events.iter().any(|e| matches!(e, FleetEvent::RunFinished { .. })));
    assert_eq!(launcher.launches().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn worker_waits_for_window_before_launching() {
    init_tracing();

    let window = LaunchWindow::new(
        TimeOfDay::from_hms(8, 0, 0).unwrap(),
        TimeOfDay::from_hms(17, 0, 0).unwrap(),
    );
    let cfg = FleetConfigBuilder::new(EXE).window(window).build();
    let launcher = Arc::new(ScriptedLauncher::always(FakeRun::Exit(minutes(1))));
    let clock = Arc::new(FixedClock::new(at(5, 0, 0)));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let fleet = Fleet::new(cfg, launcher.clone())
        .with_clock(clock)
        .with_events(tx);
    let token = fleet.cancellation_token();

    let started = tokio::time::Instant::now();
    let handle = tokio::spawn(fleet.run());

    let mut states = Vec::new();
    loop {
        let event = rx.recv().await.expect("event");
        assert_eq!(event.worker(), 1);
        match event {
            FleetEvent::StateChanged { state, .. } => states.push(state),
            FleetEvent::RunFinished { .. } => break,
            FleetEvent::Stopped { .. } => panic!("worker stopped unexpectedly"),
        }
    }
    let elapsed = started.elapsed();
    token.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(states, vec![WorkerState::WaitingForWindow, WorkerState::Running]);
    assert!(elapsed >= Duration::from_secs(3 * 3600) + minutes(1));
    assert_eq!(launcher.launches(), vec![1]);
}
