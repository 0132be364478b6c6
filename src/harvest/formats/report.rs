use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::harvest::traits::{HarvestStage, ReportError};
use crate::model::Report;

pub const REPORT_FILE_NAME: &str = "github_results.yaml";

/// Writes the report to `{output_dir}/github_results.yaml`.
///
/// The document is written to a temp file next to the target and renamed
/// over it, so an existing report is only replaced by a complete one.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE_NAME)
    }
}

impl HarvestStage for ReportWriter {
    type Input = Report;
    type Output = PathBuf;
    type Error = ReportError;

    fn execute(&self, input: Report) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let yaml = serde_yaml::to_string(&input)?;
        let mut tmp = NamedTempFile::new_in(&self.output_dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.as_file().sync_all()?;

        let target = self.report_path();
        tmp.persist(&target)?;

        info!(
            path = %target.display(),
            projects = input.projects.len(),
            "Report written"
        );
        Ok(target)
    }

    fn stage_name(&self) -> &'static str {
        "report"
    }
}

/// Reads a report previously written by [`ReportWriter`].
pub fn read_report(path: &Path) -> Result<Report, ReportError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}
