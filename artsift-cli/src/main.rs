//! Artsift CLI — batch runner for the image-URL verification pipeline.
//!
//! Loads a CSV artwork dump, verifies every candidate image reference
//! against the live source, and writes the filtered CSV back out.

use anyhow::Context;
use artsift_core::batch::ProgressSink;
use artsift_core::{Dataset, ReqwestProbeClient, Source, filter_with_client};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Artsift: keep only the artworks whose images actually resolve
#[derive(Parser, Debug)]
#[command(name = "artsift", version, about, long_about = None)]
struct Cli {
    /// Input CSV dataset
    input: PathBuf,

    /// Dataset source: met or europeana
    #[arg(short, long)]
    source: Source,

    /// Output CSV path (defaults to <input>.filtered.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of requests in flight at once
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

/// Progress sink driving an indicatif bar. `inc` keeps the bar correct
/// even though completions arrive out of order.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta} @ {per_sec})")
                .expect("static progress template")
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn on_complete(&self, _done: usize, total: usize) {
        // the scheduler knows the real target count (post-dedup); the bar
        // was sized from the row count upper bound
        if self.bar.length() != Some(total as u64) {
            self.bar.set_length(total as u64);
        }
        self.bar.inc(1);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let mut config = artsift_core::load_config(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(max_in_flight) = cli.max_in_flight {
        config.max_in_flight = max_in_flight;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.request_timeout_secs = timeout_secs;
    }
    config.validate().context("invalid configuration")?;

    let dataset = Dataset::from_csv_path(&cli.input)
        .with_context(|| format!("failed to read dataset from {}", cli.input.display()))?;
    tracing::info!(
        rows = dataset.len(),
        source = %cli.source,
        "dataset loaded"
    );

    let client = Arc::new(
        ReqwestProbeClient::new(
            Duration::from_secs(config.request_timeout_secs),
            &config.user_agent,
        )
        .context("failed to build HTTP client")?,
    );
    let targets_upper_bound = dataset.len();
    let progress = Arc::new(BarProgress::new(targets_upper_bound));

    let outcome = filter_with_client(&dataset, cli.source, &config, client, progress.clone())
        .await
        .context("pipeline failed")?;
    progress.bar.finish_and_clear();

    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("filtered.csv"));
    outcome
        .dataset
        .write_csv_path(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "{} of {} rows kept ({} of {} targets verified) in {:.1}s -> {}",
        outcome.stats.rows_out,
        outcome.stats.rows_in,
        outcome.stats.targets_valid,
        outcome.stats.targets_total,
        outcome.stats.elapsed.as_secs_f64(),
        output.display()
    );
    Ok(())
}
