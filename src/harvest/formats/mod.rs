//! Document formats read and written by the harvester.
//!
//! - `catalog` - the library catalog (YAML) consumed at the start of a run
//! - `report` - the enrichment report (YAML) written at the end of a run

pub mod catalog;
pub mod report;

pub use catalog::CatalogParser;
pub use report::{read_report, ReportWriter, REPORT_FILE_NAME};
