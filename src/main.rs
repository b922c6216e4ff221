//! dirsweep service
//!
//! Background janitor that periodically reclaims expired scratch
//! directories. Configuration comes from `dirsweep.toml` and
//! `DIRSWEEP__`-prefixed environment variables; the service runs until it
//! receives SIGINT or SIGTERM.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dirsweep::{Configuration, LocalFs, SweepScheduler, Sweeper, SystemClock};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "dirsweep.toml")]
    config: String,
}

/// Waits for a shutdown signal (SIGINT or SIGTERM)
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

        tokio::select! {
            _ = sigint.recv() => log::info!("Received SIGINT"),
            _ = sigterm.recv() => log::info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        log::info!("Received Ctrl+C");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // Load configuration
    let config = if Path::new(&args.config).exists() {
        Configuration::load_from_path(Path::new(&args.config))
            .context("Failed to load configuration")?
    } else {
        log::info!("Configuration file not found, using defaults and environment");
        Configuration::load().context("Failed to load configuration")?
    };

    // Check if sweeping is enabled
    if !config.sweep.enabled {
        log::info!("Sweeping is disabled in configuration (sweep.enabled = false)");
        log::info!("Set DIRSWEEP__SWEEP__ENABLED=true or enable in config file to run dirsweep");
        return Ok(());
    }

    log::info!("Starting dirsweep service");

    let sweeper = Arc::new(
        Sweeper::new(
            config.sweep.clone(),
            Arc::new(SystemClock),
            Arc::new(LocalFs),
        )
        .context("Invalid sweep configuration")?,
    );

    let scheduler = SweepScheduler::start(sweeper);
    log::info!(
        "Sweep scheduler started with interval {:?}",
        config.sweep.clean_interval
    );

    // Wait for shutdown signal (SIGINT or SIGTERM)
    log::info!("dirsweep service running, waiting for shutdown signal");
    wait_for_shutdown_signal().await?;

    log::info!("Received shutdown signal, stopping dirsweep service");
    scheduler.shutdown();

    log::info!("dirsweep service stopped");

    Ok(())
}
