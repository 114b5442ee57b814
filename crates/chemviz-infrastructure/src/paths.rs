//! Unified path management for chemviz files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/chemviz/           # Config directory (platform specific)
//! ├── config.toml              # Client configuration
//! └── session.toml             # Bearer token (0600)
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "chemviz";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for chemviz_core::ChemvizError {
    fn from(e: PathError) -> Self {
        chemviz_core::ChemvizError::config(e.to_string())
    }
}

/// Resolves chemviz file locations.
///
/// A base path replaces the platform config directory; tests use it to
/// stay inside a temp dir.
#[derive(Debug, Clone, Default)]
pub struct ChemvizPaths {
    base: Option<PathBuf>,
}

impl ChemvizPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the chemviz configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/chemviz/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path of the persisted session token.
    ///
    /// # Security Note
    ///
    /// The file is written with 600 permissions on Unix.
    pub fn session_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("session.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path_override() {
        let paths = ChemvizPaths::new(Some(Path::new("/tmp/chemviz-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/chemviz-test/config.toml")
        );
        assert_eq!(
            paths.session_file().unwrap(),
            PathBuf::from("/tmp/chemviz-test/session.toml")
        );
    }

    #[test]
    fn test_default_dir_ends_with_app_name() {
        // Only meaningful where a config dir exists.
        if let Ok(dir) = ChemvizPaths::default().config_dir() {
            assert!(dir.ends_with("chemviz"));
        }
    }
}
