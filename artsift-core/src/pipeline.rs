//! Pipeline entry points: extract, schedule, reconcile, report.

use crate::batch::{LogProgress, ProgressSink, run_batch};
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::ArtsiftError;
use crate::extract::extract_targets;
use crate::probe::{ProbeHttpClient, ReqwestProbeClient};
use crate::reconcile::reconcile;
use crate::source::Source;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Aggregate counts for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Lookup targets scheduled.
    pub targets_total: usize,
    /// Targets that resolved to a usable image URL.
    pub targets_valid: usize,
    /// Rows in the input dataset.
    pub rows_in: usize,
    /// Rows surviving the filter.
    pub rows_out: usize,
    /// Wall-clock time for the whole run.
    pub elapsed: Duration,
}

/// A filtered dataset plus the stats describing how it got that way.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub dataset: Dataset,
    pub stats: PipelineStats,
}

/// Filter `dataset` down to rows with a verified image URL.
///
/// The single entry point external callers invoke: builds one HTTP client
/// scoped to this invocation, fans verification out under the configured
/// cap, and reconciles results back onto a fresh copy of the table. The
/// input dataset is never modified.
pub async fn filter_by_image_availability(
    dataset: &Dataset,
    source: Source,
    config: &PipelineConfig,
) -> Result<FilterOutcome, ArtsiftError> {
    config.validate()?;
    let client = Arc::new(ReqwestProbeClient::new(
        Duration::from_secs(config.request_timeout_secs),
        &config.user_agent,
    )?);
    let progress = Arc::new(LogProgress::new(config.progress_log_every));
    filter_with_client(dataset, source, config, client, progress).await
}

/// Same pipeline with an injected HTTP client and progress sink.
///
/// The seam embedders and tests use; [`filter_by_image_availability`]
/// delegates here after building the production client.
pub async fn filter_with_client(
    dataset: &Dataset,
    source: Source,
    config: &PipelineConfig,
    client: Arc<dyn ProbeHttpClient>,
    progress: Arc<dyn ProgressSink>,
) -> Result<FilterOutcome, ArtsiftError> {
    config.validate()?;
    let start = Instant::now();

    let targets = extract_targets(dataset, source, &config.met_base_url)?;
    let targets_total = targets.len();
    info!(
        source = %source,
        targets = targets_total,
        "all verification tasks created, waiting for responses"
    );

    let results = run_batch(client, targets, source, config.max_in_flight, progress).await;
    let targets_valid = results.iter().filter(|(_, v)| v.is_valid()).count();

    let filtered = reconcile(dataset, results, source)?;
    let stats = PipelineStats {
        targets_total,
        targets_valid,
        rows_in: dataset.len(),
        rows_out: filtered.len(),
        elapsed: start.elapsed(),
    };
    info!(
        source = %source,
        targets = stats.targets_total,
        valid = stats.targets_valid,
        rows_in = stats.rows_in,
        rows_out = stats.rows_out,
        elapsed_secs = stats.elapsed.as_secs_f64(),
        "verification batch complete"
    );
    Ok(FilterOutcome {
        dataset: filtered,
        stats,
    })
}
