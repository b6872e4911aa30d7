//! File store scoped beneath a single root directory.
//!
//! Names come straight from the request target, so every access is checked
//! twice: the name must be a plain relative path, and the canonical location
//! of what it points at must stay inside the canonical root (symlinks
//! included).
//!
//! Concurrent writes to the same name are not serialized; the last writer
//! wins.

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid file name {0:?}")]
    InvalidName(String),
    #[error("{0} resolves outside the store root")]
    OutsideRoot(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StoreError {
    /// True for errors caused by the requested name rather than the disk.
    pub fn is_rejected_name(&self) -> bool {
        matches!(self, StoreError::InvalidName(_) | StoreError::OutsideRoot(_))
    }
}

/// Read/write access to files under one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = std::fs::canonicalize(root.as_ref())?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads the whole file `name`.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.join(name)?;
        let path = self.confine(&path).await?;
        Ok(fs::read(&path).await?)
    }

    /// Creates or truncates `name` and writes `data` to it.
    pub async fn write(&self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.join(name)?;

        // Parent must exist and live under the root
        if let Some(parent) = path.parent() {
            self.confine(parent).await?;
        }

        // An existing symlink would redirect the write
        if let Ok(meta) = fs::symlink_metadata(&path).await {
            if meta.file_type().is_symlink() {
                self.confine(&path).await?;
            }
        }

        fs::write(&path, data).await?;
        Ok(())
    }

    fn join(&self, name: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(name);
        let plain = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !plain {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        Ok(self.root.join(relative))
    }

    async fn confine(&self, path: &Path) -> Result<PathBuf, StoreError> {
        let canonical = fs::canonicalize(path).await?;
        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            Err(StoreError::OutsideRoot(path.to_path_buf()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_rejects_non_plain_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        for name in ["", "../secret", "a/../../b", "/etc/passwd", "./a"] {
            assert!(
                matches!(store.join(name), Err(StoreError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }

        assert_eq!(store.join("a/b.txt").unwrap(), store.root().join("a/b.txt"));
    }
}
