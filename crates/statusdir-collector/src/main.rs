//! Statusdir collector daemon.
//!
//! Builds and serves the status-endpoint directory: at startup the last
//! persisted snapshot is reloaded so serving can begin immediately with
//! stale-but-valid data, then rebuild cycles run once and on every interval
//! tick.
//!
//! # Usage
//!
//! ```bash
//! # Run with default settings
//! statusdir-collector
//!
//! # Run with custom paths and endpoints
//! statusdir-collector \
//!     --storage /data/directory.json \
//!     --source-url https://directory.example/directory.json \
//!     --validator-url https://validator.example/v2/validate
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use statusdir_collector::{EntryBuilder, HttpValidator, Rebuilder, SourceLister};
use statusdir_core::metrics::{init_metrics, metrics_router};
use statusdir_core::DirectoryStore;
use statusdir_serve::AppState;
use tracing_subscriber::EnvFilter;

/// Statusdir collector daemon.
#[derive(Parser, Debug)]
#[command(name = "statusdir-collector")]
#[command(about = "Status-endpoint directory collector daemon")]
#[command(version)]
struct Args {
    /// Path to the file for persistent storage
    #[arg(long, default_value = "./directory.json")]
    storage: PathBuf,

    /// URL of the discovery list
    #[arg(
        long,
        default_value = "https://raw.githubusercontent.com/spaceapi/directory/master/directory.json"
    )]
    source_url: String,

    /// URL of the validation service
    #[arg(long, default_value = "https://validator.example/v2/validate")]
    validator_url: String,

    /// Address for the directory API (and /metrics)
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind_addr: String,

    /// Seconds between rebuild cycles
    #[arg(long, default_value = "60")]
    interval_secs: u64,

    /// Deadline for one whole fetch batch, in seconds
    #[arg(long, default_value = "60")]
    batch_deadline_secs: u64,

    /// Per-endpoint request timeout, in seconds
    #[arg(long, default_value = "30")]
    request_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap())
                .add_directive("statusdir_collector=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    tracing::info!("statusdir collector starting...");

    let metrics_handle = init_metrics();

    let store = Arc::new(DirectoryStore::new(&args.storage));
    // A corrupt snapshot is a broken format contract and must not be
    // silently ignored; a missing one just means a cold start.
    let reloaded = store
        .reload()
        .with_context(|| format!("persisted directory at {:?} is corrupt", args.storage))?;
    if !reloaded {
        tracing::info!("no persisted directory, starting empty");
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("statusdir-collector/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    tracing::info!("Configuration:");
    tracing::info!("  Storage: {}", args.storage.display());
    tracing::info!("  Source: {}", args.source_url);
    tracing::info!("  Validator: {}", args.validator_url);
    tracing::info!("  Interval: {}s", args.interval_secs);
    tracing::info!("  Batch deadline: {}s", args.batch_deadline_secs);

    let lister = SourceLister::new(client.clone(), args.source_url);
    let validator = HttpValidator::new(client.clone(), args.validator_url);
    let builder = Arc::new(EntryBuilder::new(
        client,
        validator,
        Duration::from_secs(args.request_timeout_secs),
    ));
    let rebuilder = Rebuilder::new(
        lister,
        builder,
        Arc::clone(&store),
        Duration::from_secs(args.batch_deadline_secs),
    );

    // Directory API and /metrics share the one listener
    let app = statusdir_serve::router(AppState::new(Arc::clone(&store)))
        .merge(metrics_router(metrics_handle));
    let listener = tokio::net::TcpListener::bind(&args.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.bind_addr))?;
    tracing::info!("starting api on {}...", args.bind_addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("api server failed: {}", e);
        }
    });

    rebuilder.run(Duration::from_secs(args.interval_secs)).await;

    Ok(())
}
