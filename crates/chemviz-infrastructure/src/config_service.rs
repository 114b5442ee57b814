//! Configuration service implementation.
//!
//! Loads [`ClientConfig`] from `~/.config/chemviz/config.toml` and applies
//! the `CHEMVIZ_API_URL` environment override.

use chemviz_core::config::{API_URL_ENV, ClientConfig};
use chemviz_core::error::Result;
use std::path::{Path, PathBuf};

use crate::paths::ChemvizPaths;
use crate::storage::TomlFile;

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let path = ChemvizPaths::new(base_path).config_file()?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the config file. A missing or empty file yields defaults.
    pub fn load_file(&self) -> Result<ClientConfig> {
        let file = TomlFile::<ClientConfig>::new(self.path.clone());
        Ok(file.load()?.unwrap_or_default())
    }

    /// Reads the config file and applies the environment override.
    pub fn load(&self) -> Result<ClientConfig> {
        let config = self.load_file()?;
        Ok(apply_env_override(config, std::env::var(API_URL_ENV).ok()))
    }

    /// Writes `config` back to disk.
    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        TomlFile::new(self.path.clone()).save(config)?;
        tracing::info!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }
}

fn apply_env_override(config: ClientConfig, api_url: Option<String>) -> ClientConfig {
    match api_url.filter(|url| !url.trim().is_empty()) {
        Some(url) => {
            tracing::debug!(api_base_url = %url, "Using API URL from environment");
            config.with_api_base_url(url)
        }
        None => config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemviz_core::config::DEFAULT_API_BASE_URL;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(Some(temp_dir.path())).unwrap();

        let config = service.load_file().unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_file_values_are_read() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(Some(temp_dir.path())).unwrap();
        std::fs::write(
            service.path(),
            "api_base_url = \"https://chem.example.com/api\"\nrequest_timeout_secs = 10\n",
        )
        .unwrap();

        let config = service.load_file().unwrap();
        assert_eq!(config.api_base_url, "https://chem.example.com/api");
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(Some(temp_dir.path())).unwrap();
        let config = ClientConfig {
            download_dir: Some(temp_dir.path().join("reports")),
            ..ClientConfig::default()
        };

        service.save(&config).unwrap();
        assert_eq!(service.load_file().unwrap(), config);
    }

    #[test]
    fn test_env_override_trims_and_ignores_blank() {
        let overridden = apply_env_override(
            ClientConfig::default(),
            Some("https://override.example.com/api/".to_string()),
        );
        assert_eq!(overridden.api_base_url, "https://override.example.com/api");

        let untouched = apply_env_override(ClientConfig::default(), Some("  ".to_string()));
        assert_eq!(untouched.api_base_url, DEFAULT_API_BASE_URL);
    }
}
