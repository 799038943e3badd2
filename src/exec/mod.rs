// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the supervised
//! executable, using `tokio::process::Command`, and enforcing the per-run
//! deadline.
//!
//! - [`backend`] provides the `ProcessLauncher` trait and the request/result
//!   types that workers exchange with it. Tests replace the launcher with a
//!   fake implementation.
//! - [`command`] holds `CommandLauncher`, the production launcher.

pub mod backend;
pub mod command;

pub use backend::{LaunchRequest, ProcessLauncher, RunEnd, RunResult};
pub use command::{run_instance, CommandLauncher};
