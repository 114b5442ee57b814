//! TOML files replaced atomically on write.
//!
//! A write serializes into a temporary file in the target's directory, syncs
//! it and renames it over the target. Readers see the old content or the new
//! content, never a torn file. Read-modify-write and removal additionally
//! hold an exclusive lock on a sibling `.lock` file.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<StorageError> for chemviz_core::ChemvizError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Io(io) => io.into(),
            StorageError::Parse { source, .. } => source.into(),
            StorageError::Serialize(source) => source.into(),
            lock @ StorageError::Lock { .. } => chemviz_core::ChemvizError::io(lock.to_string()),
        }
    }
}

/// Typed handle to one TOML file.
pub struct TomlFile<T> {
    path: PathBuf,
    /// Owner-only permissions (0600) on Unix.
    private: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            private: false,
            _marker: PhantomData,
        }
    }

    /// A file only its owner may read. Used for the session token.
    pub fn private(path: impl Into<PathBuf>) -> Self {
        Self {
            private: true,
            ..Self::new(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when the file is missing or blank.
    pub fn load(&self) -> Result<Option<T>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        toml::from_str(&content)
            .map(Some)
            .map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save(&self, data: &T) -> Result<(), StorageError> {
        let serialized = toml::to_string_pretty(data)?;
        let dir = self.parent_dir()?;
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        set_mode(tmp.as_file(), self.private)?;
        tmp.write_all(serialized.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Loads (or starts from `initial`), applies `f` and saves, all under the
    /// file lock. Nothing is written when `f` fails.
    pub fn update<F>(&self, initial: T, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut T) -> Result<(), StorageError>,
    {
        self.locked(|| {
            let mut data = self.load()?.unwrap_or(initial);
            f(&mut data)?;
            self.save(&data)
        })
    }

    /// Deletes the file. Already gone is fine.
    pub fn remove(&self) -> Result<(), StorageError> {
        self.locked(|| match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        })
    }

    fn parent_dir(&self) -> Result<&Path, StorageError> {
        self.path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no parent directory", self.path.display()),
                )
                .into()
            })
    }

    fn locked<R>(&self, f: impl FnOnce() -> Result<R, StorageError>) -> Result<R, StorageError> {
        let _guard = LockGuard::acquire(self.path.with_extension("lock"))?;
        f()
    }
}

#[cfg(unix)]
fn set_mode(file: &File, private: bool) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = if private { 0o600 } else { 0o644 };
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &File, _private: bool) -> io::Result<()> {
    Ok(())
}

/// Holds an exclusive fs2 lock; the lock file is removed on drop.
struct LockGuard {
    _file: File,
    path: PathBuf,
}

impl LockGuard {
    fn acquire(path: PathBuf) -> Result<Self, StorageError> {
        use fs2::FileExt;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        if let Err(source) = file.lock_exclusive() {
            return Err(StorageError::Lock { path, source });
        }

        Ok(Self { _file: file, path })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
