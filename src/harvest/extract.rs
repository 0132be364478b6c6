//! Link extraction from the parsed catalog.

use std::collections::BTreeMap;
use tracing::{debug, info};
use url::Url;

use crate::harvest::traits::{ExtractionError, HarvestStage};
use crate::model::Catalog;

pub const GITHUB_HOST: &str = "github.com";

/// Collects outbound project links from a [`Catalog`].
///
/// As a [`HarvestStage`] it yields the GitHub links that are not owned by
/// `excluded_owner`, in catalog order, duplicates included.
pub struct UrlExtractor {
    excluded_owner: String,
}

impl UrlExtractor {
    pub fn new(excluded_owner: impl Into<String>) -> Self {
        Self {
            excluded_owner: excluded_owner.into(),
        }
    }

    /// Every record link in traversal order.
    ///
    /// # Errors
    ///
    /// [`ExtractionError::MalformedRecord`] for a record without a `link`.
    pub fn links<'a>(&self, catalog: &'a Catalog) -> Result<Vec<&'a str>, ExtractionError> {
        let mut links = Vec::new();
        for (category, languages) in catalog.categories.iter() {
            for language in languages {
                for (section, records) in language.iter() {
                    for (index, record) in records.iter().enumerate() {
                        let link = record.link.as_deref().ok_or_else(|| {
                            ExtractionError::MalformedRecord {
                                category: category.to_string(),
                                section: section.to_string(),
                                index,
                            }
                        })?;
                        links.push(link);
                    }
                }
            }
        }
        Ok(links)
    }

    /// Links grouped by host. Links that do not parse as URLs land under `""`.
    pub fn group_by_host(
        &self,
        catalog: &Catalog,
    ) -> Result<BTreeMap<String, Vec<String>>, ExtractionError> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for link in self.links(catalog)? {
            let host = Url::parse(link.trim())
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_default();
            groups.entry(host).or_default().push(link.to_string());
        }
        Ok(groups)
    }

    /// Whether the first path segment of `link` is the excluded owner.
    pub fn is_excluded(&self, link: &str) -> bool {
        let Ok(url) = Url::parse(link.trim()) else {
            return false;
        };
        let excluded = url
            .path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()))
            .is_some_and(|owner| owner.eq_ignore_ascii_case(&self.excluded_owner));
        if excluded {
            debug!(link, "Skipping excluded owner");
        }
        excluded
    }
}

impl HarvestStage for UrlExtractor {
    type Input = Catalog;
    type Output = Vec<String>;
    type Error = ExtractionError;

    fn execute(&self, input: Catalog) -> Result<Vec<String>, ExtractionError> {
        let mut groups = self.group_by_host(&input)?;
        let total: usize = groups.values().map(Vec::len).sum();
        let hosts = groups.len();

        let candidates: Vec<String> = groups
            .remove(GITHUB_HOST)
            .unwrap_or_default()
            .into_iter()
            .filter(|link| !self.is_excluded(link))
            .collect();

        info!(
            links = total,
            hosts,
            candidates = candidates.len(),
            excluded_owner = %self.excluded_owner,
            "Extracted GitHub projects"
        );
        Ok(candidates)
    }

    fn stage_name(&self) -> &'static str {
        "extract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::formats::CatalogParser;

    fn catalog(yaml: &str) -> Catalog {
        CatalogParser::parse_str(yaml).unwrap()
    }

    const MIXED: &str = r#"
api:
  - python:
      - name: foo
        link: https://github.com/DataDog/foo
      - name: baz
        link: https://github.com/bar/baz
  - go:
      - name: baz-mirror
        link: https://example.com/bar/baz
"#;

    #[test]
    fn test_selects_non_excluded_github_links() {
        let urls = UrlExtractor::new("DataDog").execute(catalog(MIXED)).unwrap();
        assert_eq!(urls, vec!["https://github.com/bar/baz".to_string()]);
    }

    #[test]
    fn test_exclusion_ignores_case() {
        let extractor = UrlExtractor::new("DataDog");
        assert!(extractor.is_excluded("https://github.com/datadog/foo"));
        assert!(extractor.is_excluded("https://github.com/DATADOG/foo"));
        // Owner must match as a whole segment.
        assert!(!extractor.is_excluded("https://github.com/DataDogHQ/foo"));
        assert!(!extractor.is_excluded("https://github.com/bar/DataDog"));
        assert!(!extractor.is_excluded("not a link"));
    }

    #[test]
    fn test_candidates_come_from_github_group() {
        let extractor = UrlExtractor::new("DataDog");
        let mixed = catalog(
            r#"
api:
  - python:
      - link: https://gitlab.com/bar/baz
      - link: not a link
      - link: https://github.com/bar/baz
      - link: https://github.com/DataDog/dd
"#,
        );

        let groups = extractor.group_by_host(&mixed).unwrap();
        assert_eq!(groups[""], vec!["not a link"]);
        assert_eq!(groups[GITHUB_HOST].len(), 2);

        let urls = extractor.execute(mixed).unwrap();
        assert_eq!(urls, vec!["https://github.com/bar/baz".to_string()]);

        let none = extractor
            .execute(catalog("api:\n  - go:\n      - link: https://example.com/x/y\n"))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let urls = UrlExtractor::new("DataDog")
            .execute(catalog(
                r#"
api:
  - python:
      - link: https://github.com/bar/baz
  - ruby:
      - link: https://github.com/bar/baz
"#,
            ))
            .unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_group_by_host() {
        let groups = UrlExtractor::new("DataDog")
            .group_by_host(&catalog(MIXED))
            .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["github.com"].len(), 2);
        assert_eq!(groups["example.com"], vec!["https://example.com/bar/baz"]);
    }

    #[test]
    fn test_missing_link_is_malformed_record() {
        let err = UrlExtractor::new("DataDog")
            .execute(catalog(
                r#"
api:
  - python:
      - name: fine
        link: https://github.com/bar/baz
      - name: broken
"#,
            ))
            .unwrap_err();

        match err {
            ExtractionError::MalformedRecord {
                category,
                section,
                index,
            } => {
                assert_eq!(category, "api");
                assert_eq!(section, "python");
                assert_eq!(index, 1);
            }
        }
    }
}
