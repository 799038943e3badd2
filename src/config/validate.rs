// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{FleetConfig, RawConfigFile};
use crate::errors::{FleetError, Result};
use crate::fs::{FileSystem, PathKind, RealFileSystem};
use crate::types::{LaunchWindow, TimeOfDay};

pub const MIN_INSTANCE_COUNT: i64 = 1;
pub const MIN_MAX_MINUTES_TO_RUN: i64 = 15;
pub const MIN_MIN_MINUTES_TO_RESTART: i64 = 5;
pub const MIN_MAX_MINUTES_TO_RESTART: i64 = 15;

impl TryFrom<RawConfigFile> for FleetConfig {
    type Error = FleetError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_with_fs(raw, &RealFileSystem)
    }
}

/// Validate a raw config against the given filesystem.
///
/// The executable check goes through [`FileSystem`] so tests can run against
/// a mock tree instead of real paths.
pub fn validate_with_fs(raw: RawConfigFile, fs: &dyn FileSystem) -> Result<FleetConfig> {
    let executable = resolve_executable(&raw, fs)?;

    let instance_count = at_least("instance_count", raw.instance_count, MIN_INSTANCE_COUNT)?;
    let max_run = at_least(
        "max_minutes_to_run",
        raw.max_minutes_to_run,
        MIN_MAX_MINUTES_TO_RUN,
    )?;
    let min_restart = at_least(
        "min_minutes_to_restart",
        raw.min_minutes_to_restart,
        MIN_MIN_MINUTES_TO_RESTART,
    )?;
    let max_restart = at_least(
        "max_minutes_to_restart",
        raw.max_minutes_to_restart,
        MIN_MAX_MINUTES_TO_RESTART,
    )?;

    let window = parse_window(
        raw.start_new_processes_after.as_deref(),
        raw.do_not_start_new_processes_after.as_deref(),
    )?;

    Ok(FleetConfig::new_unchecked(
        executable,
        raw.arguments,
        instance_count as usize,
        minutes(max_run),
        minutes(min_restart),
        minutes(max_restart),
        window,
    ))
}

/// Check the executable and return its absolute path.
///
/// The child runs with the executable's directory as its working directory,
/// so a relative path would otherwise be resolved a second time from there.
fn resolve_executable(cfg: &RawConfigFile, fs: &dyn FileSystem) -> Result<PathBuf> {
    let path = &cfg.executable_path;
    if path.as_os_str().is_empty() {
        return Err(FleetError::ConfigError(
            "executable_path must not be empty".to_string(),
        ));
    }
    match fs.probe(path) {
        PathKind::File => {}
        PathKind::Missing => {
            return Err(FleetError::ConfigError(format!(
                "executable_path {:?} does not exist",
                path
            )));
        }
        PathKind::Dir => {
            return Err(FleetError::ConfigError(format!(
                "executable_path {:?} is a directory, not a file",
                path
            )));
        }
    }
    fs.canonicalize(path).map_err(|e| {
        FleetError::ConfigError(format!("executable_path {:?} cannot be resolved: {e:#}", path))
    })
}

fn at_least(key: &str, value: i64, min: i64) -> Result<u64> {
    if value < min {
        return Err(FleetError::ConfigError(format!(
            "{key} must be >= {min} (got {value})"
        )));
    }
    Ok(value as u64)
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(60))
}

/// Parse the optional window bounds.
///
/// Unset bounds count as midnight. Both at midnight means "no window";
/// any other equal pair is rejected because the window would be empty.
pub fn parse_window(start: Option<&str>, end: Option<&str>) -> Result<Option<LaunchWindow>> {
    let start = parse_time_of_day("start_new_processes_after", start)?;
    let end = parse_time_of_day("do_not_start_new_processes_after", end)?;

    if start == end {
        if start.is_midnight() {
            return Ok(None);
        }
        return Err(FleetError::ConfigError(format!(
            "start_new_processes_after and do_not_start_new_processes_after cannot both be {start}"
        )));
    }

    Ok(Some(LaunchWindow::new(start, end)))
}

fn parse_time_of_day(key: &str, value: Option<&str>) -> Result<TimeOfDay> {
    match value.map(str::trim) {
        None | Some("") => Ok(TimeOfDay::MIDNIGHT),
        Some(s) => s
            .parse::<TimeOfDay>()
            .map_err(|e| FleetError::ConfigError(format!("{key}: {e}"))),
    }
}
