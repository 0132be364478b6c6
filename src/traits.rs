use crate::model::{CommitEntry, Contributor, ProjectRef};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure. Built with the URL stripped, since it carries the token.
    #[error("GitHub request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("GitHub returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Expected a JSON list from GitHub, got {0}")]
    UnexpectedShape(String),
    #[error("Failed to decode GitHub response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The subset of the GitHub REST API the enricher consumes.
///
/// Only the first page of each listing is requested.
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// `GET /repos/{owner}/{repo}/contributors`
    async fn contributors(&self, project: &ProjectRef) -> Result<Vec<Contributor>, ApiError>;

    /// `GET /repos/{owner}/{repo}/commits?since={since}`, `since` being an
    /// ISO-8601 UTC instant.
    async fn commits_since(
        &self,
        project: &ProjectRef,
        since: &str,
    ) -> Result<Vec<CommitEntry>, ApiError>;
}
