#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use procfleet::config::{validate_with_fs, FleetConfig, RawConfigFile};
use procfleet::errors::Result;
use procfleet::fs::FileSystem;
use procfleet::types::LaunchWindow;

/// Builder for `RawConfigFile`, starting from the smallest valid values.
pub struct RawConfigBuilder {
    config: RawConfigFile,
}

impl RawConfigBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            config: RawConfigFile {
                executable_path: executable.into(),
                arguments: vec![],
                instance_count: 1,
                max_minutes_to_run: 15,
                min_minutes_to_restart: 5,
                max_minutes_to_restart: 15,
                start_new_processes_after: None,
                do_not_start_new_processes_after: None,
            },
        }
    }

    pub fn instance_count(mut self, n: i64) -> Self {
        self.config.instance_count = n;
        self
    }

    pub fn max_minutes_to_run(mut self, n: i64) -> Self {
        self.config.max_minutes_to_run = n;
        self
    }

    pub fn min_minutes_to_restart(mut self, n: i64) -> Self {
        self.config.min_minutes_to_restart = n;
        self
    }

    pub fn max_minutes_to_restart(mut self, n: i64) -> Self {
        self.config.max_minutes_to_restart = n;
        self
    }

    pub fn window(mut self, start: &str, end: &str) -> Self {
        self.config.start_new_processes_after = Some(start.to_string());
        self.config.do_not_start_new_processes_after = Some(end.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.arguments.push(arg.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn validate(self, fs: &dyn FileSystem) -> Result<FleetConfig> {
        validate_with_fs(self.config, fs)
    }
}

/// Builder for an already-validated `FleetConfig`.
///
/// Skips validation so tests can use sub-minute durations and paths that do
/// not exist.
pub struct FleetConfigBuilder {
    executable: PathBuf,
    arguments: Vec<String>,
    instance_count: usize,
    max_run: Duration,
    min_restart: Duration,
    max_restart: Duration,
    window: Option<LaunchWindow>,
}

impl FleetConfigBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            arguments: vec![],
            instance_count: 1,
            max_run: Duration::from_secs(15 * 60),
            min_restart: Duration::from_secs(5 * 60),
            max_restart: Duration::from_secs(15 * 60),
            window: None,
        }
    }

    pub fn instance_count(mut self, n: usize) -> Self {
        self.instance_count = n;
        self
    }

    pub fn max_run(mut self, d: Duration) -> Self {
        self.max_run = d;
        self
    }

    pub fn restart_delays(mut self, min: Duration, max: Duration) -> Self {
        self.min_restart = min;
        self.max_restart = max;
        self
    }

    pub fn window(mut self, window: LaunchWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.arguments.push(arg.to_string());
        self
    }

    pub fn build(self) -> FleetConfig {
        FleetConfig::new_unchecked(
            self.executable,
            self.arguments,
            self.instance_count,
            self.max_run,
            self.min_restart,
            self.max_restart,
            self.window,
        )
    }
}

pub fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}
