//! Relay Miner main entry point
//!
//! This is the command-line interface for the Relay Miner Nostr relay crawler.

use anyhow::Context;
use clap::Parser;
use relay_miner::config::{load_effective_config, Config};
use relay_miner::crawler::crawl;
use relay_miner::output::{load_statistics, print_crawl_report, print_statistics};
use relay_miner::storage::{open_storage, GraphStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Relay Miner: a Nostr relay network crawler
///
/// Relay Miner starts from seed relays, follows NIP-65 relay lists to discover
/// neighbouring relays, screens every address, fetches NIP-11 information
/// documents, and records the resulting graph in SQLite.
#[derive(Parser, Debug)]
#[command(name = "relay-miner")]
#[command(version)]
#[command(about = "A Nostr relay network crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults and environment when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Keep the existing graph instead of cleaning it before crawling
    #[arg(long)]
    keep: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults and environment"),
    }
    let (config, config_hash) = load_effective_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(hash) = config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.keep).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("relay_miner=info,warn"),
            1 => EnvFilter::new("relay_miner=debug,info"),
            2 => EnvFilter::new("relay_miner=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration and seeds
fn handle_dry_run(config: &Config) {
    println!("=== Relay Miner Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max recursion: {}", config.crawler.max_recursion);
    println!("  Runners: {}", config.crawler.max_runners);
    println!("  Push users: {}", config.crawler.push_users);
    println!("  Poll interval: {}ms", config.crawler.poll_interval_ms);

    println!("\nProbe:");
    println!("  User agent: {}", config.probe.user_agent);
    println!("  Info document timeout: {}ms", config.probe.info_timeout_ms);
    println!("  Connect timeout: {}ms", config.probe.connect_timeout_ms);
    println!(
        "  Relay list timeout: {}s (close grace {}ms)",
        config.probe.peer_list_timeout_secs, config.probe.close_grace_ms
    );
    println!("  Relay list limit: {}", config.probe.peer_list_limit);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nSeed Relays ({}):", config.seeds.relays.len());
    for seed in &config.seeds.relays {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling from {} seed relays",
        config.seeds.relays.len()
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open graph database")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    storage.close()?;
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, keep: bool) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open graph database {}", config.output.database_path))?;
    let store: Arc<dyn GraphStore> = Arc::new(storage);

    if keep {
        tracing::info!("Keeping existing graph");
    } else {
        tracing::info!("Cleaning existing graph");
        store.clean().context("Failed to clean graph database")?;
    }

    tracing::info!("Seed relays: {}", config.seeds.relays.len());

    let report = match crawl(&config, store.clone()).await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            report
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_crawl_report(&report);
    store.close().context("Failed to close graph database")?;

    Ok(())
}
