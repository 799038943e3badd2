// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The supervised executable could not be started (or its exit status
    /// could not be collected). Fatal for the whole fleet.
    #[error("Executable {} failed", .path.display())]
    ExecutableFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker task panicked: {0}")]
    WorkerPanicked(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FleetError {
    /// True for errors that must stop every worker, not just the one that
    /// hit it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FleetError::ExecutableFailed { .. } | FleetError::WorkerPanicked(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FleetError>;
