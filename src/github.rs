//! GitHub REST client implementing [`GithubApi`] with reqwest.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

use crate::model::{CommitEntry, Contributor, ProjectRef};
use crate::traits::{ApiError, GithubApi};

pub const GITHUB_V3_ACCEPT: &str = "application/vnd.github.v3+json";

/// Error envelope GitHub returns instead of a list, e.g. `{"message": "Not Found"}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: String,
}

#[derive(Clone)]
pub struct HttpGithubClient {
    client: Client,
    token: String,
}

impl fmt::Debug for HttpGithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGithubClient")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl HttpGithubClient {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ApiError> {
        debug!(url, "GitHub request");

        let response = self
            .client
            .get(url)
            .query(&[("access_token", self.token.as_str())])
            .query(query)
            .header(ACCEPT, GITHUB_V3_ACCEPT)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .send()
            .await
            .map_err(redacted)?;

        let status = response.status();
        // Contributors of an empty repository.
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let body = response.bytes().await.map_err(redacted)?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        parse_list(&body)
    }
}

/// Drops the request URL from a transport error; its query holds the token.
fn redacted(e: reqwest::Error) -> ApiError {
    ApiError::Http(e.without_url())
}

/// Decodes a JSON array body, rejecting any other shape.
pub(crate) fn parse_list<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    match value {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        serde_json::Value::Object(ref map) => {
            let shape = match map.get("message").and_then(|m| m.as_str()) {
                Some(message) => format!("error object: {}", message),
                None => "object".to_string(),
            };
            Err(ApiError::UnexpectedShape(shape))
        }
        other => Err(ApiError::UnexpectedShape(json_kind(&other).to_string())),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[async_trait]
impl GithubApi for HttpGithubClient {
    async fn contributors(&self, project: &ProjectRef) -> Result<Vec<Contributor>, ApiError> {
        let url = format!("{}/contributors", project.api_endpoint);
        self.get_list(&url, &[]).await
    }

    async fn commits_since(
        &self,
        project: &ProjectRef,
        since: &str,
    ) -> Result<Vec<CommitEntry>, ApiError> {
        let url = format!("{}/commits", project.api_endpoint);
        self.get_list(&url, &[("since", since)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Enricher;
    use mockito::Matcher;

    fn project(server: &mockito::Server) -> ProjectRef {
        ProjectRef::from_url("https://github.com/acme/widget", &server.url()).unwrap()
    }

    #[tokio::test]
    async fn test_contributors_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/widget/contributors")
            .match_query(Matcher::UrlEncoded(
                "access_token".into(),
                "t0ken".into(),
            ))
            .match_header("accept", GITHUB_V3_ACCEPT)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"login":"alice","contributions":5},{"login":"bob","contributions":2}]"#)
            .expect(1)
            .create_async()
            .await;

        let client = HttpGithubClient::new(Client::new(), "t0ken");
        let contributors = client.contributors(&project(&server)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(contributors.len(), 2);
        assert_eq!(contributors[0].login, "alice");
        assert_eq!(contributors[1].contributions, 2);
    }

    #[tokio::test]
    async fn test_commits_request_sends_since() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/widget/commits")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("since".into(), "2026-07-19T12:00:00Z".into()),
                Matcher::UrlEncoded("access_token".into(), "t0ken".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"sha":"1","author":{"login":"carol"}},{"sha":"2","author":null}]"#)
            .expect(1)
            .create_async()
            .await;

        let client = HttpGithubClient::new(Client::new(), "t0ken");
        let commits = client
            .commits_since(&project(&server), "2026-07-19T12:00:00Z")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(commits.len(), 2);
        assert!(commits[1].author.is_none());
    }

    #[tokio::test]
    async fn test_error_status_carries_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widget/contributors")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#)
            .create_async()
            .await;

        let client = HttpGithubClient::new(Client::new(), "t0ken");
        let err = client.contributors(&project(&server)).await.unwrap_err();

        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_content_is_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widget/contributors")
            .match_query(Matcher::Any)
            .with_status(204)
            .create_async()
            .await;

        let client = HttpGithubClient::new(Client::new(), "t0ken");
        let contributors = client.contributors(&project(&server)).await.unwrap();
        assert!(contributors.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_token() {
        let client = HttpGithubClient::new(Client::new(), "SECRET_TOKEN_123");
        let enricher = Enricher::new(client, "http://127.0.0.1:1", 3);

        let report = enricher
            .enrich(&["https://github.com/bar/baz".to_string()])
            .await;

        let project = &report.projects[0];
        let error = project.error.as_deref().unwrap();
        assert!(error.starts_with("GitHub request failed"));
        assert!(!error.contains("SECRET_TOKEN_123"));

        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(!yaml.contains("SECRET_TOKEN_123"));
    }

    #[test]
    fn test_parse_list_rejects_envelope() {
        let err = parse_list::<Contributor>(br#"{"message":"Bad credentials"}"#).unwrap_err();
        assert!(
            matches!(err, ApiError::UnexpectedShape(ref s) if s.contains("Bad credentials"))
        );

        let err = parse_list::<Contributor>(b"\"nope\"").unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedShape(ref s) if s == "string"));

        let err = parse_list::<Contributor>(b"not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
