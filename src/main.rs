//! Garden-Stock main entry point
//!
//! This is the command-line interface for the garden stock extraction
//! service.

use clap::Parser;
use garden_stock::api::{build_router, AppState};
use garden_stock::config::load_config_with_hash;
use garden_stock::model::Category;
use garden_stock::scrape::{build_cycle, run_scheduler, CycleOutcome};
use garden_stock::storage::open_store;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Garden-Stock: an adaptive stock page extraction service
///
/// Garden-Stock periodically extracts item listings from the Grow a
/// Garden stock page, paces itself from the countdown hints embedded in
/// the page, and serves the latest snapshot over a small JSON API.
#[derive(Parser, Debug)]
#[command(name = "garden-stock")]
#[command(version = "1.0.0")]
#[command(about = "An adaptive stock page extraction service", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single extraction cycle, print a summary, and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.once {
        handle_once(config).await
    } else {
        handle_serve(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("garden_stock=info,warn"),
            1 => EnvFilter::new("garden_stock=debug,tower_http=debug,info"),
            2 => EnvFilter::new("garden_stock=trace,tower_http=debug,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --once mode: runs one extraction cycle and reports it
async fn handle_once(config: garden_stock::config::Config) -> anyhow::Result<()> {
    println!("=== Garden-Stock Single Cycle ===\n");
    println!("Target: {}", config.scraper.target_url);
    println!("Database: {}", config.output.database_path);
    println!();

    let store = Arc::new(Mutex::new(open_store(Path::new(
        &config.output.database_path,
    ))?));
    let cycle = build_cycle(&config, store)?;

    match cycle.run_once().await {
        CycleOutcome::Success { next_update } => {
            println!("✓ Captured {} categories", next_update.len());
            for category in Category::ALL {
                if let Some(seconds) = next_update.get(&category) {
                    println!("  - {} (page refresh in {}s)", category.as_key(), seconds);
                }
            }
            Ok(())
        }
        CycleOutcome::ParseFailure => {
            anyhow::bail!("page fetched but its structure was not recognized")
        }
        CycleOutcome::TransportFailure => {
            anyhow::bail!("the stock page could not be fetched")
        }
        CycleOutcome::Exhausted => {
            anyhow::bail!("the stock page could not be fetched (all attempts failed)")
        }
    }
}

/// Handles the default mode: scheduler loop plus the HTTP read API
async fn handle_serve(config: garden_stock::config::Config) -> anyhow::Result<()> {
    let listen: SocketAddr = config.server.listen.parse()?;

    let store = Arc::new(Mutex::new(open_store(Path::new(
        &config.output.database_path,
    ))?));
    let cycle = build_cycle(&config, store.clone())?;

    // The scheduler runs the first cycle as soon as it starts
    let (refresh_sender, refresh_receiver) = mpsc::channel(16);
    let scheduler = tokio::spawn(run_scheduler(cycle, refresh_receiver));

    let app = build_router(AppState::new(store, refresh_sender));

    tracing::info!("Serving stock API on http://{}", listen);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the router dropped the refresh channel; the scheduler loop
    // drains and stops on its own
    tracing::info!("Server stopped, draining scheduler");
    scheduler.await?;

    Ok(())
}

/// Resolves when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }
    tracing::info!("Shutdown requested");
}
