//! Lead-Harvest main entry point
//!
//! This is the command-line interface for the Lead-Harvest directory scraper.

use clap::{CommandFactory, Parser, ValueEnum};
use lead_harvest::config::{load_config_with_hash, validate, validate_listing_url, Config};
use lead_harvest::crawler::{CategoryReport, Harvester};
use lead_harvest::output::{consolidate, print_statistics, CsvStore, RunStatistics};
use lead_harvest::render::chrome::{ChromeBackend, ChromeOptions};
use lead_harvest::render::http::HttpBackend;
use lead_harvest::render::RenderBackend;
use lead_harvest::state::{JsonStatusFile, StatusReporter};
use lead_harvest::CrawlUnit;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Lead-Harvest: a directory lead extractor
///
/// Lead-Harvest walks the listing pages of a directory category, visits
/// every provider page through a small pool of browsing contexts and writes
/// one contact record per provider. Interrupted runs resume from the
/// partial output.
#[derive(Parser, Debug)]
#[command(name = "lead-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A directory lead extractor", long_about = None)]
struct Cli {
    /// Category listing URL to harvest
    #[arg(value_name = "LISTING_URL")]
    listing_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory receiving the lead files (overrides the configuration)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// How pages are rendered
    #[arg(long, value_enum, default_value_t = Backend::Chrome)]
    backend: Backend,

    /// Category label (derived from the listing URL by default)
    #[arg(long, value_name = "NAME")]
    label: Option<String>,

    /// Harvest every configured category in order
    #[arg(long, conflicts_with = "listing_url")]
    all: bool,

    /// Merge every lead file of the output directory and exit
    #[arg(long, conflicts_with_all = ["all", "dry_run"])]
    consolidate: bool,

    /// Ignore previous partial output instead of resuming from it
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Headless Chrome
    Chrome,
    /// Plain HTTP client, no JavaScript
    Http,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(dir) = &cli.output_dir {
        let status_file = config
            .output
            .status_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("status.json"));
        config.output.status_path = dir.join(status_file);
        config.output.directory = dir.clone();
    }
    validate(&config)?;

    if cli.consolidate {
        return handle_consolidate(&config);
    }

    let units = match resolve_units(&cli, &config)? {
        Some(units) => units,
        None => {
            eprintln!("{}", Cli::command().render_usage());
            eprintln!("A listing URL or --all is required");
            std::process::exit(1);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &units, cli.backend);
        return Ok(());
    }

    match cli.backend {
        Backend::Chrome => {
            let backend = ChromeBackend::launch(&ChromeOptions::from_env())?;
            handle_harvest(config, backend, &units, cli.fresh).await
        }
        Backend::Http => {
            let backend = HttpBackend::new()?;
            handle_harvest(config, backend, &units, cli.fresh).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lead_harvest=info,warn"),
            1 => EnvFilter::new("lead_harvest=debug,info"),
            2 => EnvFilter::new("lead_harvest=trace,debug"),
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

/// Crawl units selected on the command line; None when nothing was selected
fn resolve_units(
    cli: &Cli,
    config: &Config,
) -> Result<Option<Vec<CrawlUnit>>, Box<dyn std::error::Error>> {
    if cli.all {
        let units = config.configured_units();
        if units.is_empty() {
            return Err("--all needs at least one [[category]] in the configuration".into());
        }
        return Ok(Some(units));
    }

    match &cli.listing_url {
        Some(url) => {
            validate_listing_url(url)?;
            Ok(Some(vec![config.unit_for_url(url, cli.label.as_deref())]))
        }
        None => Ok(None),
    }
}

/// Handles the --dry-run mode: shows the resolved configuration and units
fn handle_dry_run(config: &Config, units: &[CrawlUnit], backend: Backend) {
    println!("=== Lead-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Backend: {:?}", backend);
    println!("  Contexts per batch: {}", config.crawler.concurrency);
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!(
        "  Navigation timeout: {}ms ({:?})",
        config.crawler.navigation_timeout_ms, config.crawler.wait_policy
    );
    println!(
        "  Batch delay: {}-{}ms",
        config.crawler.batch_delay.min_ms, config.crawler.batch_delay.max_ms
    );
    println!("  Max listing pages: {}", config.crawler.max_pages);

    println!("\nSession:");
    println!("  User agents: {}", config.session.user_agents.len());
    println!("  Viewports: {}", config.session.viewports.len());
    println!("  Accept-Language: {}", config.session.accept_language);
    println!("  Mask automation: {}", config.session.mask_automation);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Status: {}", config.output.status_path.display());

    println!("\nCategories ({}):", units.len());
    for unit in units {
        println!("  - {} ({})", unit.label, unit.listing_url);
        println!("    * {}", unit.output.display());
    }

    println!("\nConfiguration is valid");
}

/// Handles the --consolidate mode: merges the per-category files
fn handle_consolidate(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let destination = config
        .output
        .directory
        .join(&config.output.consolidated_file);

    println!("=== Consolidating Lead Files ===\n");
    println!("Directory: {}", config.output.directory.display());
    println!("Output: {}", destination.display());
    println!();

    let report = consolidate(&config.output.directory, &destination, Arc::new(CsvStore))?;

    println!(
        "Merged {} rows from {} files into {} unique leads",
        report.rows_read,
        report.files.len(),
        report.leads_written
    );

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest<B: RenderBackend>(
    config: Config,
    backend: B,
    units: &[CrawlUnit],
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh harvest (ignoring previous output)");
    } else {
        tracing::info!("Starting harvest (will resume from existing output)");
    }

    let start_time = Instant::now();
    let mut status = StatusReporter::new(JsonStatusFile::new(&config.output.status_path));
    let harvester = Harvester::new(config, backend)?.fresh(fresh);

    let results = harvester.run_all(units, &mut status).await;

    let mut reports: Vec<CategoryReport> = Vec::new();
    let mut failures = Vec::new();
    for (unit, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => failures.push(format!("{}: {}", unit.label, e)),
        }
    }

    let stats = RunStatistics::from_reports(&reports, start_time.elapsed());
    print_statistics(&stats);

    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("Category failed: {}", failure);
        }
        return Err(format!("{} of {} categories failed", failures.len(), units.len()).into());
    }

    Ok(())
}
