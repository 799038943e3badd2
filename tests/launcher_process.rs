// tests/launcher_process.rs
//
// Runs real processes through `/bin/sh`, so these are unix-only.
#![cfg(unix)]

mod common;
use crate::common::builders::{FleetConfigBuilder, RawConfigBuilder};
use crate::common::{init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use procfleet::config::FleetConfig;
use procfleet::engine::Fleet;
use procfleet::errors::FleetError;
use procfleet::exec::{run_instance, CommandLauncher, LaunchRequest, ProcessLauncher, RunEnd};
use procfleet::fs::RealFileSystem;

fn sh(script: &str, max_run: Duration) -> LaunchRequest {
    let cfg: FleetConfig = FleetConfigBuilder::new("/bin/sh")
        .arg("-c")
        .arg(script)
        .max_run(max_run)
        .build();
    LaunchRequest::from_config(1, &cfg)
}

#[tokio::test]
async fn normal_exit_reports_code_and_duration() {
    init_tracing();
    let request = sh("exit 3", Duration::from_secs(30));
    let cancel = CancellationToken::new();

    let result = with_timeout(run_instance(&request, &cancel)).await.unwrap();

    assert_eq!(result.end, RunEnd::Exited(Some(3)));
    assert!(!result.was_killed());
    assert!(result.pid.is_some());
    assert!(result.realized_duration < Duration::from_secs(30));
    assert!(result.ended_at >= result.started_at);
}

#[tokio::test]
async fn runs_in_the_executable_directory() {
    init_tracing();
    // The working directory is the executable's parent, here /bin.
    let request = sh(
        r#"test "$(pwd -P)" = "$(cd /bin && pwd -P)""#,
        Duration::from_secs(30),
    );
    assert_eq!(request.working_dir.as_deref(), Some(std::path::Path::new("/bin")));

    let result = with_timeout(CommandLauncher::new().launch(&request, &CancellationToken::new()))
        .await
        .unwrap();
    assert_eq!(result.end, RunEnd::Exited(Some(0)));
}

#[tokio::test]
async fn overrunning_process_is_killed() {
    init_tracing();
    let max_run = Duration::from_millis(300);
    let request = sh("exec sleep 30", max_run);
    let cancel = CancellationToken::new();

    let result = with_timeout(run_instance(&request, &cancel)).await.unwrap();

    assert_eq!(result.end, RunEnd::TimedOut);
    assert!(result.was_killed());
    assert!(result.realized_duration >= max_run);
    assert!(result.realized_duration < Duration::from_secs(5));
}

#[tokio::test]
async fn cancellation_kills_running_process() {
    init_tracing();
    let request = sh("exec sleep 30", Duration::from_secs(60));
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let result = with_timeout(run_instance(&request, &cancel)).await.unwrap();
    assert_eq!(result.end, RunEnd::Cancelled);
    assert!(result.was_cancelled());
}

#[tokio::test]
async fn missing_executable_is_fatal_and_names_the_path() {
    init_tracing();
    let cfg = FleetConfigBuilder::new("/definitely/not/here/worker").build();
    let request = LaunchRequest::from_config(1, &cfg);

    let err = with_timeout(run_instance(&request, &CancellationToken::new()))
        .await
        .expect_err("spawn should fail");

    assert!(matches!(err, FleetError::ExecutableFailed { .. }));
    assert!(err.to_string().contains("/definitely/not/here/worker"));
}

#[tokio::test]
async fn executable_deleted_after_validation_stops_the_fleet() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let exe = dir.path().join("worker.sh");
    std::fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();

    let cfg = RawConfigBuilder::new(&exe)
        .instance_count(2)
        .validate(&RealFileSystem)
        .unwrap();
    let resolved = std::fs::canonicalize(&exe).unwrap();
    std::fs::remove_file(&exe).unwrap();

    let fleet = Fleet::new(cfg, Arc::new(CommandLauncher::new()));
    let token = fleet.cancellation_token();

    let err = with_timeout(fleet.run()).await.expect_err("fleet should fail");

    assert!(token.is_cancelled());
    match err {
        FleetError::ExecutableFailed { path, .. } => assert_eq!(path, resolved),
        other => panic!("Expected ExecutableFailed, got: {:?}", other),
    }
}

#[tokio::test]
async fn relative_executable_is_resolved_before_launch() {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let dir = TempDir::new().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir(&bin).unwrap();
    let script = bin.join("worker.sh");
    std::fs::write(&script, "#!/bin/sh\nexit 7\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    // Validate from inside the temp dir, then leave it again: the launch must
    // not depend on the supervisor's current directory.
    let original_cwd = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let validated = RawConfigBuilder::new("bin/worker.sh").validate(&RealFileSystem);
    std::env::set_current_dir(&original_cwd).unwrap();
    let cfg = validated.unwrap();

    assert!(cfg.executable_path().is_absolute());
    assert_eq!(cfg.executable_path(), std::fs::canonicalize(&script).unwrap());
    assert_eq!(
        cfg.working_dir(),
        Some(std::fs::canonicalize(&bin).unwrap().as_path())
    );

    let request = LaunchRequest::from_config(1, &cfg);
    let result = with_timeout(run_instance(&request, &CancellationToken::new()))
        .await
        .unwrap();
    assert_eq!(result.end, RunEnd::Exited(Some(7)));
}
