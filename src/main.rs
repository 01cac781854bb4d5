//! Shelf-Scout main entry point
//!
//! This is the command-line interface for the Shelf-Scout product harvester.

use anyhow::Context;
use clap::Parser;
use shelf_scout::config::{resolve_config, validate, Config, OverCeilingPolicy};
use shelf_scout::crawler::Coordinator;
use shelf_scout::output::{
    load_statistics, print_report, print_statistics, FanoutSink, JsonLinesSink,
};
use shelf_scout::storage::{SqliteDataset, SqliteStorage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shelf-Scout: a polite marketplace product harvester
///
/// Shelf-Scout walks marketplace search result pages, follows product links
/// and writes price-filtered product records to a JSON-lines dataset, pacing
/// every request and rotating identities as it goes.
#[derive(Parser, Debug)]
#[command(name = "shelf-scout")]
#[command(version = "1.0.0")]
#[command(about = "A polite marketplace product harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// JSON actor input overlaid on the configuration
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Override the search URL the crawl starts from
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Override the cap on emitted records
    #[arg(long, value_name = "N")]
    max_products: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the dataset database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_effective_config(&cli)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_scout=info,warn"),
            1 => EnvFilter::new("shelf_scout=debug,info"),
            2 => EnvFilter::new("shelf_scout=trace,debug"),
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

/// Config file, then actor input, then command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<(Config, String)> {
    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }

    let (mut config, hash) = resolve_config(cli.config.as_deref(), cli.input.as_deref())
        .context("Failed to load configuration")?;

    if let Some(start_url) = &cli.start_url {
        config.crawl.start_url = start_url.clone();
    }
    if let Some(max_products) = cli.max_products {
        config.crawl.max_products = max_products;
    }
    validate(&config).context("Invalid command-line override")?;

    Ok((config, hash))
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Shelf-Scout Dry Run ===\n");

    println!("Crawl:");
    println!("  Start URL: {}", config.crawl.start_url);
    println!("  Max products: {}", config.crawl.max_products);
    match config.crawl.max_pages {
        Some(pages) => println!("  Max pages: {}", pages),
        None => println!("  Max pages: unbounded"),
    }
    println!(
        "  Price ceiling: ${:.2} ({})",
        config.crawl.price_ceiling,
        match config.crawl.over_ceiling {
            OverCeilingPolicy::Drop => "drop above",
            OverCeilingPolicy::Flag => "flag above",
        }
    );

    println!("\nPacing:");
    println!(
        "  Request delay: {:.1}-{:.1}s",
        config.pacing.min_delay, config.pacing.max_delay
    );
    println!(
        "  Block cooldown: {:.1}-{:.1}s",
        config.pacing.block_cooldown_min, config.pacing.block_cooldown_max
    );
    println!(
        "  Page pause: {:.1}-{:.1}s",
        config.pacing.page_pause_min, config.pacing.page_pause_max
    );
    println!("  Timeout: {:.1}s", config.pacing.request_timeout);
    println!("  Attempts per page: {}", config.pacing.max_retries);

    println!("\nProxy:");
    if config.proxy.enabled {
        println!("  Gateway: {}:{}", config.proxy.host, config.proxy.port);
        println!("  Groups: {}", config.proxy.groups.join(", "));
        println!(
            "  Country: {}",
            config.proxy.country.as_deref().unwrap_or("any")
        );
    } else {
        println!("  Disabled (direct connection)");
    }

    println!("\nSessions:");
    if config.session.rotation_enabled {
        println!(
            "  Rotate every {}-{} requests",
            config.session.min_requests, config.session.max_requests
        );
    } else {
        println!("  Rotation disabled (one session for the whole run)");
    }
    println!("  Show IP: {}", config.session.show_ip);

    println!("\nOutput:");
    println!("  Dataset: {}", config.output.dataset_path);
    match &config.output.database_path {
        Some(path) => println!("  Database: {}", path),
        None => println!("  Database: disabled"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the dataset database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = config
        .output
        .database_path
        .as_deref()
        .context("No database path configured ([output] database-path)")?;

    println!("Database: {}\n", path);

    let storage = SqliteStorage::new(Path::new(path))
        .with_context(|| format!("Failed to open database {}", path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    let dataset = Path::new(&config.output.dataset_path);
    let mut sink = FanoutSink::new().with(
        JsonLinesSink::open(dataset)
            .with_context(|| format!("Failed to open dataset {}", dataset.display()))?,
    );

    if let Some(path) = &config.output.database_path {
        let db = SqliteDataset::open(Path::new(path), config_hash)
            .with_context(|| format!("Failed to open database {}", path))?;
        tracing::info!("Recording run {} in {}", db.run_id(), path);
        sink = sink.with(db);
    }

    let mut coordinator = Coordinator::new(config, sink)?;
    match coordinator.run().await {
        Ok(report) => {
            if !report.stop_reason.is_failure() {
                tracing::info!("Crawl completed successfully");
            }
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
