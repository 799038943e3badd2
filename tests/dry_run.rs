// tests/dry_run.rs

use std::io::Write;

use tempfile::{NamedTempFile, TempDir};

use procfleet::cli::CliArgs;

fn config_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{body}").unwrap();
    file
}

#[tokio::test]
async fn dry_run_validates_without_launching() {
    let dir = TempDir::new().unwrap();
    let exe = dir.path().join("worker.sh");
    std::fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();

    let file = config_file(&format!(
        r#"
executable_path = "{}"
instance_count = 2
max_minutes_to_run = 20
min_minutes_to_restart = 5
max_minutes_to_restart = 20
start_new_processes_after = "21:00"
do_not_start_new_processes_after = "05:00"
"#,
        exe.display()
    ));

    let args = CliArgs {
        config: Some(file.path().to_string_lossy().into_owned()),
        log_level: None,
        dry_run: true,
    };

    procfleet::run(args).await.unwrap();
}

#[tokio::test]
async fn invalid_config_fails_before_anything_starts() {
    let file = config_file(
        r#"
executable_path = "/definitely/not/here/worker"
instance_count = 2
max_minutes_to_run = 20
min_minutes_to_restart = 5
max_minutes_to_restart = 20
"#,
    );

    let args = CliArgs {
        config: Some(file.path().to_string_lossy().into_owned()),
        log_level: None,
        dry_run: false,
    };

    let err = procfleet::run(args).await.expect_err("config should be rejected");
    assert!(format!("{err}").contains("does not exist"));
}
