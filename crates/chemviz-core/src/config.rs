//! Client configuration model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const REPORT_FILE_NAME: &str = "report.pdf";

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "CHEMVIZ_API_URL";

/// Contents of `config.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend API, without a trailing slash.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Where `report.pdf` is saved. Defaults to the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            download_dir: None,
        }
    }
}

impl ClientConfig {
    /// Replaces the base URL, trimming trailing slashes.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Joins an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Directory reports are saved into.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_partial_file() {
        let config: ClientConfig = toml::from_str("request_timeout_secs = 5").unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout_secs, 5);
        assert!(config.download_dir.is_none());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ClientConfig::default().with_api_base_url("https://example.com/api/");
        assert_eq!(config.endpoint("/history/"), "https://example.com/api/history/");
        assert_eq!(config.endpoint("token/"), "https://example.com/api/token/");
    }

    #[test]
    fn download_dir_falls_back_to_working_dir() {
        let config = ClientConfig {
            download_dir: Some(PathBuf::from("/tmp/reports")),
            ..ClientConfig::default()
        };
        assert_eq!(config.download_dir(), PathBuf::from("/tmp/reports"));
        assert_eq!(ClientConfig::default().download_dir(), PathBuf::from("."));
    }
}
