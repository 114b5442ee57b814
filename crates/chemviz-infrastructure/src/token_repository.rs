//! File-backed bearer token storage.

use async_trait::async_trait;
use chemviz_core::error::{ChemvizError, Result};
use chemviz_core::session::TokenRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::paths::ChemvizPaths;
use crate::storage::TomlFile;

/// On-disk form of `session.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

/// Persists the token in `session.toml`, readable by the owner only.
#[derive(Clone)]
pub struct FileTokenRepository {
    file: Arc<TomlFile<StoredSession>>,
}

impl FileTokenRepository {
    /// Uses the default session file location.
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let path = ChemvizPaths::new(base_path).session_file()?;
        Ok(Self::with_path(path))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: Arc::new(TomlFile::private(path)),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&TomlFile<StoredSession>) -> Result<T> + Send + 'static,
    {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| ChemvizError::io(format!("Token storage task failed: {}", e)))?
    }
}

#[async_trait]
impl TokenRepository for FileTokenRepository {
    async fn load_token(&self) -> Result<Option<String>> {
        self.blocking(|file| {
            let stored = file.load()?;
            Ok(stored
                .and_then(|s| s.token)
                .filter(|token| !token.is_empty()))
        })
        .await
    }

    async fn save_token(&self, token: &str) -> Result<()> {
        let token = token.to_string();
        self.blocking(move |file| {
            file.update(StoredSession::default(), |stored| {
                stored.token = Some(token);
                stored.saved_at = Some(Utc::now());
                Ok(())
            })?;
            Ok(())
        })
        .await?;
        tracing::debug!(path = %self.path().display(), "Session token saved");
        Ok(())
    }

    async fn clear_token(&self) -> Result<()> {
        self.blocking(|file| Ok(file.remove()?)).await?;
        tracing::debug!(path = %self.path().display(), "Session token cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_has_no_token() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileTokenRepository::new(Some(temp_dir.path())).unwrap();

        assert_eq!(repo.load_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_token_survives_new_instance() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileTokenRepository::new(Some(temp_dir.path())).unwrap();
        repo.save_token("jwt-abc").await.unwrap();

        let reopened = FileTokenRepository::new(Some(temp_dir.path())).unwrap();
        assert_eq!(reopened.load_token().await.unwrap(), Some("jwt-abc".to_string()));
    }

    #[tokio::test]
    async fn test_clear_removes_token() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileTokenRepository::new(Some(temp_dir.path())).unwrap();
        repo.save_token("jwt-abc").await.unwrap();

        repo.clear_token().await.unwrap();
        assert_eq!(repo.load_token().await.unwrap(), None);

        // Clearing with nothing stored still succeeds.
        repo.clear_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileTokenRepository::new(Some(temp_dir.path())).unwrap();
        std::fs::write(repo.path(), "token = [unterminated").unwrap();

        let err = repo.load_token().await.unwrap_err();
        assert!(matches!(err, ChemvizError::Serialization { .. }));
    }
}
