// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod window;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, FleetConfig};
use crate::engine::{BackoffPolicy, Fleet};
use crate::exec::CommandLauncher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + validation
/// - the fleet of workers with the real process launcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let fleet = Fleet::new(cfg, Arc::new(CommandLauncher::new()));

    // Ctrl-C → graceful shutdown.
    {
        let token = fleet.cancellation_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; stopping fleet");
            token.cancel();
        });
    }

    fleet.run().await?;
    Ok(())
}

/// Simple dry-run output: print the validated settings.
fn print_dry_run(cfg: &FleetConfig) {
    let backoff = BackoffPolicy::from_config(cfg);

    println!("procfleet dry-run");
    println!("  executable_path = {}", cfg.executable_path().display());
    if !cfg.arguments().is_empty() {
        println!("  arguments = {:?}", cfg.arguments());
    }
    if let Some(dir) = cfg.working_dir() {
        println!("  working_dir = {}", dir.display());
    }
    println!("  instance_count = {}", cfg.instance_count());
    println!("  max_run = {} min", cfg.max_run_duration().as_secs() / 60);
    println!(
        "  restart delay = {} .. {} min",
        backoff.min_delay.as_secs() / 60,
        backoff.max_delay.as_secs() / 60
    );
    match cfg.window() {
        Some(window) => println!("  launch window = {window}"),
        None => println!("  launch window = always"),
    }
}
