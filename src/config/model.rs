// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::LaunchWindow;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// executable_path = "/opt/jobs/bin/importer"
/// arguments = ["--batch"]
/// instance_count = 3
/// max_minutes_to_run = 60
/// min_minutes_to_restart = 5
/// max_minutes_to_restart = 30
/// start_new_processes_after = "22:00"
/// do_not_start_new_processes_after = "06:00"
/// ```
///
/// Numeric keys are required; the window keys and `arguments` are optional.
/// Everything here is unchecked; convert into [`FleetConfig`] to validate.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Program to supervise. Run directly, never through a shell.
    pub executable_path: PathBuf,

    /// Arguments passed verbatim to every instance.
    #[serde(default)]
    pub arguments: Vec<String>,

    /// Number of concurrently supervised instances.
    pub instance_count: i64,

    /// Hard ceiling for a single run, in minutes.
    pub max_minutes_to_run: i64,

    /// Base backoff unit between runs, in minutes.
    pub min_minutes_to_restart: i64,

    /// Backoff ceiling, in minutes.
    pub max_minutes_to_restart: i64,

    /// `"HH:MM"` or `"HH:MM:SS"`; launches wait until this time of day.
    #[serde(default)]
    pub start_new_processes_after: Option<String>,

    /// `"HH:MM"` or `"HH:MM:SS"`; no launches after this time of day.
    #[serde(default)]
    pub do_not_start_new_processes_after: Option<String>,
}

/// Validated, immutable fleet configuration.
///
/// Built once at startup (see `config::validate`) and shared read-only by the
/// orchestrator and every worker.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    executable_path: PathBuf,
    arguments: Vec<String>,
    instance_count: usize,
    max_run_duration: Duration,
    min_restart_delay: Duration,
    max_restart_delay: Duration,
    window: Option<LaunchWindow>,
}

impl FleetConfig {
    /// Construct without validation. Only `config::validate` and tests that
    /// need out-of-range values (e.g. sub-minute durations) should call this.
    pub fn new_unchecked(
        executable_path: PathBuf,
        arguments: Vec<String>,
        instance_count: usize,
        max_run_duration: Duration,
        min_restart_delay: Duration,
        max_restart_delay: Duration,
        window: Option<LaunchWindow>,
    ) -> Self {
        Self {
            executable_path,
            arguments,
            instance_count,
            max_run_duration,
            min_restart_delay,
            max_restart_delay,
            window,
        }
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    pub fn max_run_duration(&self) -> Duration {
        self.max_run_duration
    }

    pub fn min_restart_delay(&self) -> Duration {
        self.min_restart_delay
    }

    pub fn max_restart_delay(&self) -> Duration {
        self.max_restart_delay
    }

    /// `None` means launches are allowed at any time of day.
    pub fn window(&self) -> Option<LaunchWindow> {
        self.window
    }

    /// Directory the executable is launched from.
    pub fn working_dir(&self) -> Option<&Path> {
        self.executable_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
    }
}
