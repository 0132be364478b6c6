use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::collections::BTreeMap;
use url::Url;

use crate::harvest::traits::EnrichmentError;

// ============================================================================
// Catalog
// ============================================================================

/// A YAML mapping that keeps the document order of its keys.
///
/// Read through [`serde_yaml::Mapping`], which preserves insertion order,
/// then typed entry by entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Mapping", bound(deserialize = "V: DeserializeOwned"))]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: DeserializeOwned> TryFrom<Mapping> for OrderedMap<V> {
    type Error = serde_yaml::Error;

    fn try_from(mapping: Mapping) -> Result<Self, Self::Error> {
        mapping
            .into_iter()
            .map(|(key, value)| -> Result<(String, V), serde_yaml::Error> {
                Ok((serde_yaml::from_value(key)?, serde_yaml::from_value(value)?))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(OrderedMap)
    }
}

/// Parsed library catalog.
///
/// Shape: category → list of language groupings, where each grouping maps a
/// section name to its library records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub categories: OrderedMap<Vec<LanguageGroup>>,
}

/// One language grouping inside a category: section name → records.
pub type LanguageGroup = OrderedMap<Vec<LibraryRecord>>;

/// A single library entry from the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    /// Any other fields the catalog carries for this record.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

// ============================================================================
// Projects
// ============================================================================

/// A GitHub project derived from a catalog link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub url: String,
    pub owner: String,
    pub repo: String,
    /// `{api_base}/repos/{owner}/{repo}`
    pub api_endpoint: String,
}

impl ProjectRef {
    /// Derives owner and repo from the first two path segments of `url`.
    ///
    /// Anything after the repo segment (`/tree/main`, `#readme`, ...) is ignored.
    pub fn from_url(url: &str, api_base: &str) -> Result<Self, EnrichmentError> {
        let malformed = || EnrichmentError::MalformedProjectUrl(url.to_string());

        let parsed = Url::parse(url.trim()).map_err(|_| malformed())?;
        let mut segments = parsed
            .path_segments()
            .ok_or_else(malformed)?
            .filter(|s| !s.is_empty());

        let owner = segments.next().ok_or_else(malformed)?.to_string();
        let repo = segments.next().ok_or_else(malformed)?.to_string();

        let api_endpoint = format!(
            "{}/repos/{}/{}",
            api_base.trim_end_matches('/'),
            owner,
            repo
        );

        Ok(Self {
            url: url.to_string(),
            owner,
            repo,
            api_endpoint,
        })
    }
}

// ============================================================================
// GitHub payloads
// ============================================================================

/// Entry of `GET /repos/{owner}/{repo}/contributors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
}

/// Entry of `GET /repos/{owner}/{repo}/commits`.
///
/// GitHub sends `"author": null` when the commit email does not map to an
/// account, so only the fields needed for attribution are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitEntry {
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub author: Option<CommitAccount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitAccount {
    #[serde(default)]
    pub login: Option<String>,
}

/// Who a commit is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitAuthor {
    Resolved(String),
    /// The API could not map the commit to an account.
    Unresolved,
}

impl CommitEntry {
    pub fn author(&self) -> CommitAuthor {
        match self.author.as_ref().and_then(|a| a.login.as_deref()) {
            Some(login) if !login.is_empty() => CommitAuthor::Resolved(login.to_string()),
            _ => CommitAuthor::Unresolved,
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Enrichment result for one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub project_url: String,
    #[serde(rename = "_name")]
    pub name: String,
    #[serde(default)]
    pub contributors: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_recents: BTreeMap<String, u64>,
    /// Set when the project could not be enriched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProjectReport {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// All enrichment results of a run, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    pub projects: Vec<ProjectReport>,
}

impl Report {
    pub fn failed_count(&self) -> usize {
        self.projects.iter().filter(|p| p.is_failed()).count()
    }
}
