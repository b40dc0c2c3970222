//! logsweep - runs log retention cleaners inside a long-lived host process.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::HostConfig;
use logsweep_retention::{Cleaner, CleanerHandle, CycleReport};

/// Log retention daemon
#[derive(Parser)]
#[command(name = "logsweep")]
#[command(about = "Compresses and expires rotated log files")]
#[command(version)]
struct Args {
    /// Configuration file path (falls back to LOGSWEEP_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run every cleaner until Ctrl+C or SIGTERM (default)
    Run,
    /// Run one cycle per cleaner and print the reports as JSON
    Once,
}

#[derive(Serialize)]
struct NamedReport {
    path: PathBuf,
    prefix: String,
    report: CycleReport,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(&args.log_level, args.json_logs);

    let config = match &args.config {
        Some(path) => HostConfig::load(path),
        None => HostConfig::from_env(),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Once => once(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: HostConfig) -> anyhow::Result<()> {
    let mut handles: Vec<CleanerHandle> = Vec::with_capacity(config.cleaners.len());
    for cleaner in config.cleaners {
        handles.push(Cleaner::spawn(cleaner)?);
    }

    info!(cleaners = handles.len(), "Press Ctrl+C to stop");

    shutdown_signal().await;

    // Joining waits for any in-flight cycle to finish.
    tokio::task::spawn_blocking(move || {
        for mut handle in handles {
            handle.stop();
        }
    })
    .await?;

    info!("All cleaners stopped");
    Ok(())
}

async fn once(config: HostConfig) -> anyhow::Result<()> {
    let reports = tokio::task::spawn_blocking(move || {
        config
            .cleaners
            .into_iter()
            .map(|cleaner_config| -> anyhow::Result<NamedReport> {
                let cleaner = Cleaner::new(cleaner_config)?;
                let policy = cleaner.policy();
                Ok(NamedReport {
                    path: policy.dir().to_path_buf(),
                    prefix: policy.prefix().to_string(),
                    report: cleaner.run_once(),
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await??;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping cleaners");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping cleaners");
        }
    }
}
