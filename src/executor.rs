use crate::harvest::traits::EnrichmentError;
use crate::model::{CommitAuthor, CommitEntry, Contributor, ProjectRef, ProjectReport, Report};
use crate::traits::GithubApi;
use chrono::{DateTime, Months, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Queries GitHub for each project link, one project at a time.
pub struct Enricher<C> {
    client: C,
    api_base: String,
    window_months: u32,
}

impl<C> Enricher<C>
where
    C: GithubApi,
{
    pub fn new(client: C, api_base: impl Into<String>, window_months: u32) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            window_months,
        }
    }

    pub fn stage_name(&self) -> &'static str {
        "enrich"
    }

    /// Enriches every link with the recent window ending now.
    pub async fn enrich(&self, urls: &[String]) -> Report {
        self.enrich_at(urls, Utc::now()).await
    }

    /// Enriches every link with the recent window ending at `now`.
    ///
    /// A project that fails keeps its entry, with `error` set and empty
    /// mappings; the remaining projects are still processed.
    pub async fn enrich_at(&self, urls: &[String], now: DateTime<Utc>) -> Report {
        let since = cutoff_stamp(now, self.window_months);
        let mut projects = Vec::with_capacity(urls.len());

        for url in urls {
            info!(project = %url, "Processing");
            let entry = match self.enrich_url(url, &since).await {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(project = %url, error = %e, "Enrichment failed");
                    ProjectReport {
                        project_url: url.clone(),
                        name: fallback_name(url),
                        error: Some(e.to_string()),
                        ..Default::default()
                    }
                }
            };
            projects.push(entry);
        }

        Report { projects }
    }

    async fn enrich_url(&self, url: &str, since: &str) -> Result<ProjectReport, EnrichmentError> {
        let project = ProjectRef::from_url(url, &self.api_base)?;
        self.enrich_project(&project, since).await
    }

    /// Contributors plus commits since `since` for a single project.
    ///
    /// The API endpoint is not carried into the returned entry.
    #[instrument(skip(self), fields(owner = %project.owner, repo = %project.repo))]
    pub async fn enrich_project(
        &self,
        project: &ProjectRef,
        since: &str,
    ) -> Result<ProjectReport, EnrichmentError> {
        let contributors = tally_contributors(self.client.contributors(project).await?);
        let commits = self.client.commits_since(project, since).await?;
        let top_recents = tally_recent_commits(&commits);

        debug!(
            contributors = contributors.len(),
            commits = commits.len(),
            recent_authors = top_recents.len(),
            "Project enriched"
        );

        Ok(ProjectReport {
            project_url: project.url.clone(),
            name: project.repo.clone(),
            contributors,
            top_recents,
            error: None,
        })
    }
}

/// `now` minus `months` calendar months, as `YYYY-MM-DDTHH:MM:SSZ`.
///
/// Month subtraction clamps to the last day of the target month
/// (May 31 minus three months is Feb 28/29).
pub fn cutoff_stamp(now: DateTime<Utc>, months: u32) -> String {
    let cutoff = now
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    cutoff.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// login → contributions. If a login is listed twice the later entry wins.
pub fn tally_contributors(contributors: Vec<Contributor>) -> BTreeMap<String, u64> {
    contributors
        .into_iter()
        .map(|c| (c.login, c.contributions))
        .collect()
}

/// login → number of commits. Commits without a resolvable author are skipped.
pub fn tally_recent_commits(commits: &[CommitEntry]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for commit in commits {
        match commit.author() {
            CommitAuthor::Resolved(login) => *counts.entry(login).or_insert(0) += 1,
            CommitAuthor::Unresolved => {
                debug!(sha = ?commit.sha, "Skipping commit with unresolved author");
            }
        }
    }
    counts
}

/// Repo name for a link that could not be turned into a [`ProjectRef`].
fn fallback_name(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
