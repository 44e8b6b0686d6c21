//! CLI entry point for the listing rater.
//!
//! Fetches every business matching a location from the search API (or reuses
//! the saved `out.json`), validates the result, and writes one file per
//! weighted-rating tier.

mod infra;

use crate::infra::yelp::client::YelpClient;
use anyhow::Result;
use clap::Parser;
use listing_rater::clock::SystemClock;
use listing_rater::config::{
    DEFAULT_CATEGORY, DEFAULT_CONFIDENCE, DEFAULT_RADIUS, DEFAULT_TERM, DEFAULT_THRESHOLDS,
    MAX_PAGE_SIZE, RunConfig, SearchConfig,
};
use listing_rater::pipeline::run;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const USAGE: &str = "\
Call this program with an argument to be passed into the location parameter of the \
search API (i.e. \"Los Angeles, CA\"). Results are not fetched again by default: delete \
out.json, or pass --refresh, to regenerate them. API_KEY must be set in the environment \
or in a .env file. Star rating thresholds and the confidence level are set with \
--threshold and --confidence; run with --help for every option.";

#[derive(Parser)]
#[command(name = "listing_rater")]
#[command(about = "Rank business listings by confidence-adjusted rating", long_about = None)]
struct Cli {
    /// Location to search (e.g. "Los Angeles, CA")
    #[arg(value_name = "LOCATION")]
    location: Option<String>,

    /// Search term
    #[arg(long, default_value = DEFAULT_TERM)]
    term: String,

    /// Category filter; repeat for several
    #[arg(short, long = "category", default_values_t = [DEFAULT_CATEGORY.to_string()])]
    categories: Vec<String>,

    /// Search radius in meters
    #[arg(short, long, default_value_t = DEFAULT_RADIUS)]
    radius: u32,

    /// Results per request
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    page_size: u32,

    /// Weighted star thresholds, highest first
    #[arg(
        short,
        long = "threshold",
        value_delimiter = ',',
        default_values_t = DEFAULT_THRESHOLDS
    )]
    thresholds: Vec<f64>,

    /// Confidence level in (0, 1); higher is stricter
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Directory for out.json, tier files and the archive
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Fetch again even if out.json exists
    #[arg(long, default_value_t = false)]
    refresh: bool,

    /// Log each business's confidence interval before tiering
    #[arg(long, default_value_t = false)]
    intervals: bool,
}

/// The location to search, or `None` when usage should be printed instead.
fn location(cli: &Cli) -> Option<&str> {
    cli.location.as_deref().filter(|l| !l.contains("help"))
}

/// Colored stderr plus a JSON rolling log file. Keep the guard alive until
/// exit so the file writer flushes.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/listing_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("listing_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();
    let Some(location) = location(&cli).map(str::to_string) else {
        println!("{USAGE}");
        return Ok(());
    };

    let _file_guard = init_logging()?;

    let run_config = RunConfig {
        thresholds: cli.thresholds,
        confidence_level: cli.confidence,
        output_dir: cli.output_dir,
        refresh: cli.refresh,
        intervals: cli.intervals,
    };

    // Only reached on a cache miss; a cached run needs no API_KEY.
    let connect = move || -> Result<(YelpClient, SearchConfig)> {
        let config = SearchConfig::from_env(location)?
            .with_term(cli.term)
            .with_categories(cli.categories)
            .with_radius(cli.radius)
            .with_page_size(cli.page_size)?;
        let client = YelpClient::new(&config.api_key)?;
        Ok((client, config))
    };

    let tiering = run(connect, &run_config, &SystemClock).await?;
    info!(
        tiers = tiering.tiers.len(),
        failed = tiering.remainder.len(),
        "Run complete"
    );

    Ok(())
}
