//! Crawlsheet main entry point
//!
//! This is the command-line interface: it crawls one site and writes a row per
//! page and per secondary asset to a CSV or SQLite file.

use anyhow::{Context, Result};
use clap::Parser;
use crawlsheet::config::{load_config_with_hash, validate, Config};
use crawlsheet::crawler::{build_http_client, CrawlStats, ReqwestTransport, SiteCrawler};
use crawlsheet::pipeline::{PipelineSettings, RunSummary, TracingProgress};
use crawlsheet::url::extract_host;
use crawlsheet::{canonicalize_url, open_sink, Pipeline};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Capacity of the crawl event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Crawlsheet: crawl a site into a spreadsheet
///
/// Crawlsheet crawls every page of one host, resolves the images, scripts and
/// stylesheets each page references, and writes status, timing, size, SEO and
/// Open Graph fields for all of them to a CSV (or SQLite) file.
#[derive(Parser, Debug)]
#[command(name = "crawlsheet")]
#[command(version)]
#[command(about = "Crawl a site into a spreadsheet", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "START_URL")]
    start_url: String,

    /// Output file (.csv, or .db/.sqlite/.sqlite3); defaults to <host>.csv
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Replace the output file if it exists
    #[arg(long)]
    overwrite: bool,

    /// Maximum number of pages to crawl
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Number of records per batch written to the output
    #[arg(long, value_name = "N")]
    flush_threshold: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and show the effective settings without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        None => (Config::default(), "default".to_string()),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    let start_url = canonicalize_url(&cli.start_url)
        .with_context(|| format!("Invalid start URL: {}", cli.start_url))?;
    let output = output_path(&cli, &config, &start_url);

    if cli.dry_run {
        handle_dry_run(&config, start_url.as_str(), &output);
        return Ok(());
    }

    let (summary, stats) = handle_crawl(config, &config_hash, start_url.as_str(), output).await?;
    if !cli.quiet {
        summary.print();
        print_crawl_stats(&stats);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawlsheet=info,warn"),
            1 => EnvFilter::new("crawlsheet=debug,info"),
            2 => EnvFilter::new("crawlsheet=trace,debug"),
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

/// Applies command-line flags on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(threshold) = cli.flush_threshold {
        config.pipeline.flush_threshold = threshold;
    }
    if cli.overwrite {
        config.output.overwrite = true;
    }
    if let Some(output) = &cli.output {
        config.output.path = Some(output.display().to_string());
    }
}

/// Output file: the configured path, or `<host>.csv` in the current directory
fn output_path(cli: &Cli, config: &Config, start_url: &url::Url) -> PathBuf {
    if let Some(path) = &cli.output {
        return path.clone();
    }
    if let Some(path) = &config.output.path {
        return PathBuf::from(path);
    }
    let host = extract_host(start_url).unwrap_or_else(|| "crawl".to_string());
    PathBuf::from(format!("{}.csv", host))
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, start_url: &str, output: &std::path::Path) {
    println!("=== Crawlsheet Dry Run ===\n");

    println!("Start URL: {}", start_url);
    println!("Output: {}", output.display());
    println!("  Overwrite: {}", config.output.overwrite);

    println!("\nCrawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages_open
    );
    println!(
        "  Minimum time on page: {}ms",
        config.crawler.minimum_time_on_page
    );
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nPipeline:");
    println!("  Flush threshold: {}", config.pipeline.flush_threshold);
    println!("  Retry attempts: {}", config.pipeline.retry_attempts);
    println!("  Retry backoff: {}ms", config.pipeline.retry_backoff_ms);
    println!(
        "  Retryable statuses: {:?}",
        config.pipeline.retryable_statuses
    );
    println!(
        "  Ignored disallow reasons: {:?}",
        config.pipeline.ignored_disallow_reasons
    );
    println!(
        "  Max concurrent resolves: {}",
        config.pipeline.max_concurrent_resolves
    );

    println!("\n✓ Configuration is valid");
}

/// Runs the crawl and the pipeline side by side
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    start_url: &str,
    output: PathBuf,
) -> Result<(RunSummary, CrawlStats)> {
    let sink = open_sink(&output, config.output.overwrite, config_hash)?;
    tracing::info!("Writing results to {}", output.display());

    let client = build_http_client(&config.user_agent).context("Failed to build HTTP client")?;
    let pipeline = Pipeline::new(
        PipelineSettings::from(&config.pipeline),
        ReqwestTransport::new(client.clone()),
        sink,
        Arc::new(TracingProgress::default()),
    );
    let crawler = SiteCrawler::new(&config, client);

    let (sender, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let pipeline_task = tokio::spawn(pipeline.run(receiver));

    let crawl_result = crawler.crawl(start_url, sender).await;
    let summary = pipeline_task.await.context("Pipeline task panicked")?;

    // A pipeline failure closes the channel, so report it ahead of the crawl error
    match (crawl_result, summary) {
        (_, Err(e)) => Err(e.into()),
        (Err(e), Ok(_)) => Err(e.into()),
        (Ok(stats), Ok(summary)) => {
            tracing::info!(
                "Wrote {} records to {}",
                summary.records_written,
                output.display()
            );
            Ok((summary, stats))
        }
    }
}

fn print_crawl_stats(stats: &CrawlStats) {
    println!("=== Crawl Engine ===\n");
    println!("  Pages fetched:       {}", stats.pages_fetched);
    println!("  No response:         {}", stats.pages_failed);
    println!("  Robots.txt blocked:  {}", stats.robots_disallowed);
    println!("  Data URI links:      {}", stats.data_links);
    println!("  Over crawl limits:   {}", stats.links_over_limit);
    println!();
}
