//! Harvest pipeline executor.
//!
//! This module provides the [`HarvestPipeline`] coordinator that runs the
//! harvest stages strictly in order (Fetch → Parse → Extract → Enrich →
//! Report) with:
//! - Async network stages via `tokio` and `reqwest`
//! - Per-request connect and total timeouts taken from the config
//! - Structured logging via `tracing`
//! - Cleanup of the scratch directory via RAII (`Drop` on the config's `TempDir`)

use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::executor::Enricher;
use crate::github::HttpGithubClient;
use crate::harvest::extract::UrlExtractor;
use crate::harvest::fetch::CatalogFetcher;
use crate::harvest::formats::{CatalogParser, ReportWriter};
use crate::harvest::traits::{
    CatalogError, ConfigError, ExtractionError, FetchError, HarvestStage, ReportError,
};
use crate::model::Report;

// ============================================================================
// Pipeline Types
// ============================================================================

/// Complete harvest result with the report and statistics.
#[derive(Debug)]
pub struct HarvestResult {
    /// Enrichment results, in catalog order
    pub report: Report,

    /// Where the report was written
    pub report_path: PathBuf,

    /// Timing and counters
    pub stats: HarvestStats,
}

/// Statistics about the harvest run.
#[derive(Debug, Default, Clone)]
pub struct HarvestStats {
    /// Total time spent on the entire run (milliseconds)
    pub total_duration_ms: u64,

    /// Per-stage timings, in execution order
    pub stages: Vec<StageTiming>,

    /// Size of the downloaded catalog (bytes)
    pub catalog_bytes: u64,

    /// GitHub projects selected for enrichment
    pub candidates: usize,

    /// Projects whose enrichment failed
    pub projects_failed: usize,
}

/// Wall-clock time of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    /// Stage name as reported by the stage itself
    pub stage: &'static str,

    /// Duration (milliseconds)
    pub duration_ms: u64,
}

impl HarvestStats {
    /// Records and logs the time `stage` took since `started`.
    fn record(&mut self, stage: &'static str, started: Instant) {
        let duration_ms = elapsed_ms(started);
        info!(stage, duration_ms, "Stage completed");
        self.stages.push(StageTiming { stage, duration_ms });
    }

    /// Duration of the named stage, if it ran.
    pub fn stage_duration_ms(&self, stage: &str) -> Option<u64> {
        self.stages
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.duration_ms)
    }
}

/// Executes a synchronous stage and records its timing under its own name.
fn run_stage<S: HarvestStage>(
    stage: &S,
    input: S::Input,
    stats: &mut HarvestStats,
) -> Result<S::Output, S::Error> {
    let started = Instant::now();
    let output = stage.execute(input)?;
    stats.record(stage.stage_name(), started);
    Ok(output)
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Fatal errors. Any of these ends the run without writing a report.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Runs one harvest from a validated [`Config`].
///
/// # Example
///
/// ```ignore
/// let config = Config::load(Path::new("config.yaml"))?;
/// let result = HarvestPipeline::new(config)?.run().await?;
/// println!("{} projects", result.report.projects.len());
/// ```
pub struct HarvestPipeline {
    config: Config,
    client: reqwest::Client,
}

impl HarvestPipeline {
    /// Builds the shared HTTP client with the configured timeouts.
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(PipelineError::Client)?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Executes every stage in order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the catalog cannot be downloaded, parsed
    /// or walked, or if the report cannot be written. Per-project GitHub
    /// failures are not errors; they are recorded in the report.
    pub async fn run(&self) -> Result<HarvestResult, PipelineError> {
        let start = Instant::now();
        let mut stats = HarvestStats::default();

        // ====================================================================
        // Stage 1: Fetch
        // ====================================================================

        let stage_start = Instant::now();
        let catalog_path = self.config.catalog_path();
        let fetcher = CatalogFetcher::new(self.client.clone());
        stats.catalog_bytes = fetcher
            .fetch(&self.config.libraries_src, &catalog_path)
            .await?;
        stats.record(fetcher.stage_name(), stage_start);

        // ====================================================================
        // Stage 2: Parse
        // ====================================================================

        let catalog = run_stage(&CatalogParser, catalog_path, &mut stats)?;

        // ====================================================================
        // Stage 3: Extract
        // ====================================================================

        let extractor = UrlExtractor::new(self.config.excluded_owner.as_str());
        let urls = run_stage(&extractor, catalog, &mut stats)?;
        stats.candidates = urls.len();

        // ====================================================================
        // Stage 4: Enrich
        // ====================================================================

        let stage_start = Instant::now();
        let enricher = Enricher::new(
            HttpGithubClient::new(self.client.clone(), self.config.github_token.as_str()),
            self.config.api_base_url.as_str(),
            self.config.recent_window_months,
        );
        let report = enricher.enrich(&urls).await;
        stats.projects_failed = report.failed_count();
        stats.record(enricher.stage_name(), stage_start);

        if stats.projects_failed > 0 {
            warn!(
                failed = stats.projects_failed,
                total = stats.candidates,
                "Some projects could not be enriched"
            );
        }

        // ====================================================================
        // Stage 5: Report
        // ====================================================================

        let writer = ReportWriter::new(&self.config.output_dir);
        let report_path = run_stage(&writer, report.clone(), &mut stats)?;

        stats.total_duration_ms = elapsed_ms(start);
        info!(
            duration_ms = stats.total_duration_ms,
            projects = report.projects.len(),
            failed = stats.projects_failed,
            "Harvest completed"
        );

        Ok(HarvestResult {
            report,
            report_path,
            stats,
        })
    }
}

/// Runs a full harvest and returns the report.
pub async fn run(config: Config) -> Result<Report, PipelineError> {
    Ok(HarvestPipeline::new(config)?.run().await?.report)
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================
