use std::path::PathBuf;
use tracing::info;

use crate::harvest::traits::{CatalogError, HarvestStage};
use crate::model::Catalog;

/// Parses a downloaded catalog file. The whole document must be well-formed.
pub struct CatalogParser;

impl CatalogParser {
    pub fn parse_str(content: &str) -> Result<Catalog, CatalogError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

impl HarvestStage for CatalogParser {
    type Input = PathBuf;
    type Output = Catalog;
    type Error = CatalogError;

    fn execute(&self, input: PathBuf) -> Result<Catalog, CatalogError> {
        let content = std::fs::read_to_string(&input)?;
        let catalog = Self::parse_str(&content)?;
        info!(
            path = %input.display(),
            categories = catalog.categories.len(),
            "Catalog parsed"
        );
        Ok(catalog)
    }

    fn stage_name(&self) -> &'static str {
        "parse"
    }
}
