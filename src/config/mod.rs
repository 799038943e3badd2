// src/config/mod.rs

//! Configuration loading and validation for procfleet.
//!
//! Responsibilities:
//! - Define the TOML-backed raw model and the validated `FleetConfig` (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate ranges, the executable path and the launch window (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_with_fs};
pub use model::{FleetConfig, RawConfigFile};
pub use validate::{parse_window, validate_with_fs};
