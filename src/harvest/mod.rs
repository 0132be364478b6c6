//! Harvest module - catalog fetch, extraction and report pipeline.
//!
//! This module provides the stages of a harvest run:
//! - **Traits**: [`HarvestStage`] and one error type per stage
//! - **Fetch**: streaming catalog download via [`fetch::CatalogFetcher`]
//! - **Formats**: catalog parsing and report writing
//! - **Extract**: GitHub link selection via [`extract::UrlExtractor`]
//! - **Pipeline**: ordered executor via [`pipeline::HarvestPipeline`]

pub mod extract;
pub mod fetch;
pub mod formats;
pub mod pipeline;
pub mod traits;

// Re-export commonly used types
pub use traits::{
    CatalogError, ConfigError, EnrichmentError, ExtractionError, FetchError, HarvestStage,
    ReportError,
};

pub use extract::UrlExtractor;
pub use fetch::CatalogFetcher;
pub use formats::{CatalogParser, ReportWriter};
pub use pipeline::{
    run, HarvestPipeline, HarvestResult, HarvestStats, PipelineError, StageTiming,
};
