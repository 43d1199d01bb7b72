//! Recrawl main entry point
//!
//! This is the command-line interface for the Recrawl incremental crawler.

use anyhow::{Context, Result};
use clap::Parser;
use recrawl::cache::{ChangeCache, MemoryCache};
use recrawl::config::{load_config_with_overrides, Config, Overrides};
use recrawl::crawler::{build_http_client, Coordinator, Scheduler};
use recrawl::output::{load_statistics, print_statistics};
use recrawl::storage::{lock, open_shared, SharedStorage};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Recrawl: an incremental, change-detecting crawler
///
/// Recrawl periodically fetches a seed page, follows the article links it
/// finds, and downloads only the pages that changed since the last cycle.
#[derive(Parser, Debug)]
#[command(name = "recrawl")]
#[command(version)]
#[command(about = "An incremental, change-detecting crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH", default_value = "recrawl.toml")]
    config: PathBuf,

    /// Seed link to crawl (overrides the config file)
    #[arg(short, long, value_name = "URL")]
    link: Option<String>,

    /// Directory to save pages to (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    directory: Option<String>,

    /// Maximum number of links crawled per cycle (overrides the config file)
    #[arg(short = 'n', long, value_name = "N")]
    number_of_links: Option<u32>,

    /// Number of concurrent workers (overrides the config file)
    #[arg(short = 'w', long, value_name = "N")]
    max_workers: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Explicit log filter, e.g. "recrawl=debug" (takes precedence over -v/-q)
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Run at most one cycle, then exit
    #[arg(long, conflicts_with_all = ["serve", "stats"])]
    once: bool,

    /// Serve the admin API on this address instead of crawling
    #[arg(long, value_name = "ADDR", conflicts_with_all = ["once", "stats"])]
    serve: Option<SocketAddr>,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["once", "serve"])]
    stats: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            seed_link: self.link.clone(),
            directory: self.directory.clone(),
            max_links_per_cycle: self.number_of_links,
            max_workers: self.max_workers,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_level.as_deref());

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config_with_overrides(&cli.config, &cli.overrides())
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let storage = open_shared(Path::new(&config.store.database_path)).with_context(|| {
        format!("Failed to open database {}", config.store.database_path)
    })?;

    if cli.stats {
        return handle_stats(&config, &storage);
    }

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    if let Some(addr) = cli.serve {
        return recrawl::api::serve(storage, addr, shutdown)
            .await
            .with_context(|| format!("Admin API on {} failed", addr));
    }

    handle_crawl(&config, storage, shutdown, cli.once).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, explicit: Option<&str>) {
    let filter = match explicit {
        Some(directives) => EnvFilter::new(directives),
        None if quiet => EnvFilter::new("error"),
        None => match verbose {
            0 => EnvFilter::new("recrawl=info,warn"),
            1 => EnvFilter::new("recrawl=debug,info"),
            2 => EnvFilter::new("recrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config, storage: &SharedStorage) -> Result<()> {
    println!("Database: {}\n", config.store.database_path);

    let guard = lock(storage)?;
    let stats = load_statistics(&*guard).context("Failed to load statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the crawl: a single tick with --once, otherwise the scheduler loop
async fn handle_crawl(
    config: &Config,
    storage: SharedStorage,
    shutdown: CancellationToken,
    once: bool,
) -> Result<()> {
    tracing::info!(
        "Seed: {}, workers: {}, links per cycle: {}",
        config.crawler.seed_link,
        config.crawler.max_workers,
        config.crawler.max_links_per_cycle
    );

    let client = build_http_client(&config.crawler).context("Failed to build HTTP client")?;
    let cache: Arc<dyn ChangeCache> = Arc::new(MemoryCache::new());
    let coordinator = Coordinator::new(config, client, Arc::clone(&cache), storage.clone())
        .context("Failed to set up crawl coordinator")?;
    let scheduler = Scheduler::new(coordinator, cache, storage, &config.sync);

    if once {
        if scheduler.tick(&shutdown).await.is_none() {
            tracing::info!("No cycle due");
        }
    } else {
        scheduler.run(shutdown).await;
    }

    Ok(())
}

/// Cancels `token` on Ctrl-C or SIGTERM
fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown requested, finishing in-flight work");
        token.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("Could not install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
