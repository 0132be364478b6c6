//! Run configuration loaded from a YAML document.
//!
//! Only `github_token` is required. Every other key falls back to a default
//! in [`Config::sanity_check`].

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use crate::harvest::traits::ConfigError;

pub const DEFAULT_LIBRARIES_SRC: &str =
    "https://raw.githubusercontent.com/DataDog/documentation/master/data/libraries.yaml";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_EXCLUDED_OWNER: &str = "DataDog";
pub const DEFAULT_RECENT_WINDOW_MONTHS: u32 = 3;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Config document as written by the user. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    github_token: Option<String>,
    temp_dir: Option<PathBuf>,
    libraries_src: Option<String>,
    output_dir: Option<PathBuf>,
    api_base_url: Option<String>,
    excluded_owner: Option<String>,
    recent_window_months: Option<u32>,
    connect_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

/// Working directory for the downloaded catalog.
#[derive(Debug)]
pub enum WorkDir {
    /// Created for this run; removed on drop.
    Scratch(TempDir),
    /// Supplied by the config; left in place.
    Provided(PathBuf),
}

impl WorkDir {
    pub fn path(&self) -> &Path {
        match self {
            WorkDir::Scratch(dir) => dir.path(),
            WorkDir::Provided(path) => path,
        }
    }
}

/// Validated configuration. Immutable for the rest of the run.
pub struct Config {
    pub github_token: String,
    pub temp_dir: WorkDir,
    pub libraries_src: String,
    pub output_dir: PathBuf,
    pub api_base_url: String,
    pub excluded_owner: String,
    pub recent_window_months: u32,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("github_token", &"[REDACTED]")
            .field("temp_dir", &self.temp_dir.path())
            .field("libraries_src", &self.libraries_src)
            .field("output_dir", &self.output_dir)
            .field("api_base_url", &self.api_base_url)
            .field("excluded_owner", &self.excluded_owner)
            .field("recent_window_months", &self.recent_window_months)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Reads, parses and sanity-checks the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = if content.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        Self::sanity_check(raw)
    }

    /// Fills defaults where a sane one exists; bails on a missing token.
    fn sanity_check(raw: RawConfig) -> Result<Self, ConfigError> {
        let github_token = raw
            .github_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        let temp_dir = match raw.temp_dir {
            Some(path) => WorkDir::Provided(path),
            None => WorkDir::Scratch(
                tempfile::Builder::new()
                    .prefix("gh-harvest-")
                    .tempdir()
                    .map_err(ConfigError::TempDir)?,
            ),
        };

        Ok(Self {
            github_token,
            temp_dir,
            libraries_src: raw
                .libraries_src
                .unwrap_or_else(|| DEFAULT_LIBRARIES_SRC.to_string()),
            output_dir: raw
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            api_base_url: raw
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            excluded_owner: raw
                .excluded_owner
                .unwrap_or_else(|| DEFAULT_EXCLUDED_OWNER.to_string()),
            recent_window_months: raw
                .recent_window_months
                .unwrap_or(DEFAULT_RECENT_WINDOW_MONTHS),
            connect_timeout: Duration::from_secs(
                raw.connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            request_timeout: Duration::from_secs(
                raw.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        })
    }

    /// Where the downloaded catalog is stored.
    pub fn catalog_path(&self) -> PathBuf {
        self.temp_dir.path().join("libraries.yaml")
    }
}
