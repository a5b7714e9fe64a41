//! viewlog-analyzer - viewing history reconciliation
//!
//! Reads a streaming service viewing history export, classifies every entry as a
//! movie or an episode, looks the titles up on Trakt and writes three delimited
//! files (movies, episodes, unresolved) enriched with runtime and catalog metadata.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use viewlog_analyzer::services::{
    OutputRouter, ReconciliationOrchestrator, RunOptions, TraktClient,
};
use viewlog_common::config::{load_toml_config, resolve_client_id};
use viewlog_common::logging::init_tracing;

/// Command-line arguments for viewlog-analyzer
#[derive(Parser, Debug)]
#[command(name = "viewlog-analyzer")]
#[command(about = "Enrich a viewing history export with Trakt metadata")]
#[command(version)]
struct Args {
    /// Viewing history export (CSV with Title,Date columns)
    #[arg(default_value = "NetflixViewingHistory.csv")]
    input: PathBuf,

    /// Trakt API client id (64 characters)
    #[arg(short = 'k', long)]
    client_id: Option<String>,

    /// Directory receiving the output files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Config file (defaults to ~/.config/viewlog/config.toml)
    #[arg(short, long, env = "VIEWLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Records reconciled concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seconds allowed for catalog lookups and reconciliation
    #[arg(long)]
    drain_timeout: Option<u64>,

    /// Accept episode title matches below this edit distance
    #[arg(long)]
    match_threshold: Option<usize>,

    /// Debug logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI values override the TOML file
    let mut config =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(workers) = args.workers {
        config.analyzer.workers = workers;
    }
    if let Some(drain_timeout) = args.drain_timeout {
        config.analyzer.drain_timeout_secs = drain_timeout;
    }
    if let Some(threshold) = args.match_threshold {
        config.analyzer.match_threshold = threshold;
    }

    init_tracing(&config.logging, args.verbose).context("Failed to initialize logging")?;

    info!("Starting viewlog-analyzer");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let client_id = resolve_client_id(args.client_id.as_deref(), &config)
        .context("Invalid Trakt configuration")?;

    if !args.input.is_file() {
        anyhow::bail!("Can not read viewing history file: {}", args.input.display());
    }

    let output_dir = args
        .output_dir
        .or_else(|| config.output_folder.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    info!(
        input = %args.input.display(),
        output_dir = %output_dir.display(),
        "Paths resolved"
    );

    let client = TraktClient::new(&client_id, config.analyzer.requests_per_second)
        .context("Failed to build Trakt client")?;
    let router = OutputRouter::create(&output_dir, &config.analyzer.delimiter)
        .context("Failed to create output files")?;

    let orchestrator =
        ReconciliationOrchestrator::new(Arc::new(client), RunOptions::from(&config.analyzer));

    let cancel_token = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel_token.clone()));

    let summary = orchestrator
        .run_file(&args.input, &router, &cancel_token)
        .await
        .context("Reconciliation run failed")?;

    println!("{}", summary);
    Ok(())
}

/// Cancel the run on Ctrl+C (and SIGTERM on Unix)
async fn cancel_on_shutdown(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, finishing in-flight records");
    cancel_token.cancel();
}
