//! Streaming download of the remote catalog.

use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

use crate::harvest::traits::FetchError;

/// Size of the write buffer between the response stream and the file.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Downloads a text document to a local file.
///
/// Timeouts come from the `reqwest::Client` it is built with.
pub struct CatalogFetcher {
    client: reqwest::Client,
}

impl CatalogFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn stage_name(&self) -> &'static str {
        "fetch"
    }

    /// Streams `url` into `dest`.
    ///
    /// Either the whole body ends up in `dest` and the byte count is
    /// returned, or `dest` is removed and an error is returned. No retry.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        info!(url, "Attempting to download");

        let result = self.download(url, dest).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(dest).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %dest.display(), error = %e, "Failed to remove partial download");
                }
            }
        }

        let bytes = result?;
        info!(path = %dest.display(), bytes, "Downloaded");
        Ok(bytes)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(dest).await?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);

        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let mut response = self.client.get(url).send().await.map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(http_err)? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_writes_body() {
        let mut server = mockito::Server::new_async().await;
        let body = "api:\n  - python:\n      - name: x\n        link: https://github.com/a/b\n";
        let mock = server
            .mock("GET", "/libraries.yaml")
            .with_status(200)
            .with_body(body)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libraries.yaml");
        let fetcher = CatalogFetcher::new(reqwest::Client::new());

        let bytes = fetcher
            .fetch(&format!("{}/libraries.yaml", server.url()), &dest)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, body.len() as u64);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_failure_removes_file() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/libraries.yaml")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libraries.yaml");
        let fetcher = CatalogFetcher::new(reqwest::Client::new());

        let err = fetcher
            .fetch(&format!("{}/libraries.yaml", server.url()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libraries.yaml");
        let fetcher = CatalogFetcher::new(reqwest::Client::new());

        // Port 1 on loopback is never listening in the test environment.
        let err = fetcher
            .fetch("http://127.0.0.1:1/libraries.yaml", &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Http { .. }));
        assert!(!dest.exists());
    }
}
