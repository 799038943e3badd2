// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{FleetConfig, RawConfigFile};
use crate::config::validate::validate_with_fs;
use crate::errors::{FleetError, Result};
use crate::fs::FileSystem;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (ranges, executable existence, window). Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Checks that the executable exists.
/// - Checks the numeric lower bounds.
/// - Parses the optional launch window.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<FleetConfig> {
    let raw_config = load_from_path(&path)?;
    let config = FleetConfig::try_from(raw_config)?;
    Ok(config)
}

/// Same as [`load_and_validate`], but reads the file and checks the
/// executable through `fs`.
pub fn load_with_fs(path: impl AsRef<Path>, fs: &dyn FileSystem) -> Result<FleetConfig> {
    let contents = fs.read_to_string(path.as_ref()).map_err(FleetError::Other)?;
    let raw_config: RawConfigFile = toml::from_str(&contents)?;
    validate_with_fs(raw_config, fs)
}

/// Default config location: `ProcFleet.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("ProcFleet.toml")
}
