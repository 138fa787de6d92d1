//! Output storage for build artifacts
//!
//! Every artifact of a build (rewritten manifest, merged document, template
//! page, EPUB, canonical assets) is written through an [`OutputStore`] using
//! store-relative paths such as `images/cover.png`. The pipeline's worker
//! threads share one store, so implementations must be `Send + Sync`.

use crate::error::StorageError;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Abstract output store
pub trait OutputStore: Send + Sync {
    /// Read data from the given path
    fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Write data to the given path, replacing any previous content
    fn write(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Check if a path exists
    fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Copy a file from outside the store into it
    fn copy_in(&self, source: &Path, dest: &str) -> StorageResult<()> {
        let data = std::fs::read(source).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(source.display().to_string()),
            std::io::ErrorKind::PermissionDenied => {
                StorageError::PermissionDenied(source.display().to_string())
            }
            _ => StorageError::BackendError(e.to_string()),
        })?;
        self.write(dest, &data)
    }
}

/// Reject paths that would escape the store root
fn normalize(path: &str) -> StorageResult<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                return Err(StorageError::PermissionDenied(format!(
                    "path escapes output directory: {}",
                    path
                )));
            }
        }
    }
    Ok(normalized)
}

/// Local filesystem store rooted at the build output directory
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a new local store with the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &str) -> StorageResult<PathBuf> {
        Ok(self.root.join(normalize(path)?))
    }
}

impl OutputStore for LocalStorage {
    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full_path = self.full_path(path)?;
        std::fs::read(full_path).map_err(|e| StorageError::NotFound(e.to_string()))
    }

    fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let full_path = self.full_path(path)?;
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::BackendError(e.to_string()))?;
        }
        std::fs::write(full_path, data).map_err(|e| StorageError::BackendError(e.to_string()))
    }

    fn exists(&self, path: &str) -> StorageResult<bool> {
        let full_path = self.full_path(path)?;
        full_path
            .try_exists()
            .map_err(|e| StorageError::BackendError(e.to_string()))
    }
}

/// In-memory store (for testing)
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &str) -> StorageResult<String> {
        Ok(normalize(path)?.to_string_lossy().replace('\\', "/"))
    }

    fn lock_error() -> StorageError {
        StorageError::BackendError("memory store lock poisoned".to_string())
    }
}

impl OutputStore for MemoryStorage {
    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let key = Self::key(path)?;
        self.data
            .read()
            .map_err(|_| Self::lock_error())?
            .get(&key)
            .cloned()
            .ok_or(StorageError::NotFound(key))
    }

    fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let key = Self::key(path)?;
        self.data
            .write()
            .map_err(|_| Self::lock_error())?
            .insert(key, data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> StorageResult<bool> {
        let key = Self::key(path)?;
        Ok(self
            .data
            .read()
            .map_err(|_| Self::lock_error())?
            .contains_key(&key))
    }
}
