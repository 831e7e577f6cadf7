//! Catalog-Sweep main entry point
//!
//! This is the command-line interface for the Catalog-Sweep product harvester.

use catalog_sweep::config::{load_config_with_hash, validate, Config, FetchMode, Overrides};
use catalog_sweep::crawler::scrape;
use catalog_sweep::output::print_statistics;
use catalog_sweep::{DedupMode, RunOutcome};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Sweep: a resilient product catalog harvester
///
/// Walks a product listing, visits every product page, and writes one
/// folder per product with a text summary and the downloaded PDF manuals.
#[derive(Parser, Debug)]
#[command(name = "catalog-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A resilient product catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Maximum number of listing pages to visit
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: Option<u32>,

    /// Keep every document link instead of one per path
    #[arg(long)]
    all_pdfs: bool,

    /// Use plain HTTP requests instead of a headless browser
    #[arg(long = "static")]
    static_mode: bool,

    /// Output directory (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Validate config and show what would be scraped without scraping
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            max_pages: self.max_pages,
            dedup: self.all_pdfs.then_some(DedupMode::All),
            mode: self.static_mode.then_some(FetchMode::Static),
            output_root: self.output.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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

    let config = config.with_overrides(cli.overrides());
    validate(&config)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_scrape(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_sweep=info,warn"),
            1 => EnvFilter::new("catalog_sweep=debug,info"),
            2 => EnvFilter::new("catalog_sweep=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Sweep Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Listing URL: {}", config.site.listing_url);
    match config.site.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unlimited"),
    }

    println!("\nFetching:");
    println!("  Mode: {:?}", config.fetch.mode);
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Download timeout: {}s", config.fetch.download_timeout_secs);
    println!(
        "  Attempts: {} (backoff from {}ms)",
        config.fetch.max_attempts, config.fetch.backoff_base_ms
    );
    if config.fetch.mode == FetchMode::Browser {
        println!("  Headless: {}", config.fetch.headless);
    }

    println!("\nTiming (ms):");
    println!("  Settle: {}", config.timing.settle);
    println!("  Product wait: {}", config.timing.product_wait);
    println!("  Detail wait: {}", config.timing.detail_wait);
    println!("  Politeness: {}", config.timing.politeness);

    println!("\nOutput:");
    println!("  Root: {}", config.output.root);
    println!("  Documents: {}", config.output.dedup);

    println!("\n✓ Configuration is valid");
}

/// Handles the main scrape, stopping cleanly on Ctrl-C
async fn handle_scrape(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tokio::select! {
        result = scrape(config) => match result {
            Ok(RunOutcome::Completed(stats)) => {
                tracing::info!("Run completed successfully");
                print_statistics(&stats);
                Ok(())
            }
            Ok(RunOutcome::NoProducts) => {
                println!("No parts found. The page might need authentication or has a different structure.");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Run failed: {}", e);
                Err(e.into())
            }
        },
        signal = tokio::signal::ctrl_c() => {
            // The scrape future is dropped here, which releases the browser
            match signal {
                Ok(()) => tracing::warn!("Interrupted; stopping"),
                Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
            }
            Ok(())
        }
    }
}
