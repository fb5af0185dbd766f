//! Stockwatch CLI
//!
//! Local entry point: resolve product links, inspect the tracked set and run
//! the restock poller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use stockwatch::{
    error::{AppError, Result},
    models::Config,
    pipeline::{Poller, Resolver, Tracker},
    services::notifier_from_config,
    storage::{LocalStorage, ProductStore},
    utils::{ConcurrencyGate, Gated, HttpFetcher, create_async_client},
};

/// Stockwatch - storefront product resolver and restock watcher
#[derive(Parser, Debug)]
#[command(
    name = "stockwatch",
    version,
    about = "Resolve storefront products and watch them for restocks"
)]
struct Cli {
    /// Path to storage directory containing config and snapshot files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve product links, ids or names and start tracking them
    Resolve {
        /// Product URLs, cart links, numeric ids or search terms
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Print every tracked product
    List,

    /// Re-check every tracked product once
    Poll,

    /// Re-check tracked products on the configured interval until Ctrl-C
    Watch {
        /// Override the poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Validate configuration file
    Validate,

    /// Show storage info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Wire the fetcher, sources, store and notifier together.
async fn build_tracker(config: &Config, storage_dir: &Path) -> Result<Tracker> {
    let client = create_async_client(&config.http)?;
    let gate = ConcurrencyGate::new(config.http.max_concurrent);
    let fetcher = Arc::new(Gated::new(HttpFetcher::new(client.clone()), gate));

    let backend = LocalStorage::new(storage_dir, config.storage.db_file.clone());
    let store = ProductStore::open(Arc::new(backend)).await?;

    Ok(Tracker::new(
        Resolver::new(fetcher, config.site.clone()),
        store,
        notifier_from_config(&config.notify, client),
        config.http.max_concurrent,
    ))
}

/// Validate the config and build the tracker. A corrupt snapshot stops startup.
async fn open_tracker(config: &Config, storage_dir: &Path) -> Result<Arc<Tracker>> {
    config.validate()?;

    match build_tracker(config, storage_dir).await {
        Ok(tracker) => Ok(Arc::new(tracker)),
        Err(e) => {
            if e.is_fatal() {
                log::error!("Cannot start: {}", e);
            }
            Err(e)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    config.apply_env_overrides();

    log::debug!("Loaded configuration from {}", config_path.display());

    match cli.command {
        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Resolve { inputs } => {
            let tracker = open_tracker(&config, &cli.storage_dir).await?;
            let products = tracker.resolve_all(&inputs).await;
            print_json(&products)?;

            if products.is_empty() {
                return Err(AppError::validation("no input could be resolved"));
            }
        }

        Command::List => {
            let tracker = open_tracker(&config, &cli.storage_dir).await?;
            print_json(&tracker.list().await)?;
        }

        Command::Poll => {
            let tracker = open_tracker(&config, &cli.storage_dir).await?;
            let poller = Poller::new(
                Arc::clone(&tracker),
                Duration::from_secs(config.poll.interval_secs),
                config.http.max_concurrent,
            );
            let report = poller.run_cycle().await;
            print_json(&report.events)?;
        }

        Command::Watch { interval } => {
            let tracker = open_tracker(&config, &cli.storage_dir).await?;
            let secs = interval.unwrap_or(config.poll.interval_secs).max(1);
            log::info!(
                "Watching {} products every {}s (Ctrl-C to stop)",
                tracker.store().len().await,
                secs
            );

            let poller = Poller::new(
                Arc::clone(&tracker),
                Duration::from_secs(secs),
                config.http.max_concurrent,
            );
            poller.run_cycle().await;
            poller
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("Failed to listen for Ctrl-C: {}", e);
                    }
                })
                .await;
        }

        Command::Info => {
            let tracker = open_tracker(&config, &cli.storage_dir).await?;
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Snapshot file: {}", config.storage.db_file);

            let records = tracker.list().await;
            log::info!("Tracked products: {}", records.len());
            if let Some(latest) = records.iter().map(|r| r.last_seen).max() {
                log::info!("Last updated: {}", latest);
            }
            let in_stock = records
                .iter()
                .filter(|r| r.product.has_available_variants())
                .count();
            log::info!("In stock: {}", in_stock);
        }
    }

    Ok(())
}
