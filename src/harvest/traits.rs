//! Core traits and error types for the harvest stages.
//!
//! This module defines:
//! - The synchronous stage abstraction [`HarvestStage`]
//! - One error type per stage, aggregated by
//!   [`PipelineError`](crate::harvest::pipeline::PipelineError)

use std::path::PathBuf;
use thiserror::Error;

use crate::traits::ApiError;

// ============================================================================
// Pipeline Trait
// ============================================================================

/// Generic pipeline stage that transforms Input → Output.
///
/// Implemented by the CPU-bound stages (catalog parsing, URL extraction,
/// report writing). The network-bound stages are async and live on
/// [`CatalogFetcher`](crate::harvest::fetch::CatalogFetcher) and
/// [`Enricher`](crate::executor::Enricher).
///
/// # Examples
///
/// ```ignore
/// let catalog = CatalogParser.execute(path)?;
/// let urls = UrlExtractor::new("DataDog").execute(catalog)?;
/// ```
pub trait HarvestStage: Send + Sync {
    /// Input type consumed by this stage
    type Input;

    /// Output type produced by this stage
    type Output;

    /// Error type for stage failures
    type Error: std::error::Error + Send + Sync + 'static;

    /// Executes the stage.
    ///
    /// # Errors
    ///
    /// Returns `Err` if processing fails. The error should name the input
    /// that caused it.
    fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    /// Returns a human-readable name for this stage.
    ///
    /// Keys the stage's entry in
    /// [`HarvestStats::stages`](crate::harvest::pipeline::HarvestStats) and
    /// its "Stage completed" log line.
    fn stage_name(&self) -> &'static str;
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while loading the configuration document.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML or has a mistyped value
    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `github_token` is absent; there is no default for it
    #[error("Need to specify \"github_token\" in config")]
    MissingCredential,

    /// The scratch directory could not be created
    #[error("Failed to create temp dir: {0}")]
    TempDir(#[source] std::io::Error),
}

/// Errors raised while downloading the catalog.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Server answered with a non-success status
    #[error("Could not download {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    /// Transport failure (connect, timeout, broken body stream)
    #[error("Could not download {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Destination file could not be written
    #[error("I/O error while writing catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while parsing the downloaded catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog is not a well-formed document of the expected shape
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Errors raised while extracting project links.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A library record carries no `link`
    #[error("Malformed record #{index} in {category}/{section}: missing link")]
    MalformedRecord {
        category: String,
        section: String,
        index: usize,
    },
}

/// Per-project enrichment failures. Recorded in the report, never fatal.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// Link is not of the shape `https://github.com/<owner>/<repo>[...]`
    #[error("Malformed project URL: {0}")]
    MalformedProjectUrl(String),

    /// GitHub request failed or returned an unusable body
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors raised while writing the report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Output directory or temp file could not be created or written
    #[error("I/O error while writing report: {0}")]
    Io(#[from] std::io::Error),

    /// Report could not be serialized
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// Temp file could not be renamed over the report path
    #[error("Failed to move report into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

// ============================================================================
// Tests
// ============================================================================
