//! Error types for Folio Core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using FolioError
pub type Result<T> = std::result::Result<T, FolioError>;

/// Top-level error type for all Folio operations
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reading the chapter manifest. Always fatal for a build.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read manifest {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors resolving or materializing a single asset
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Copy failed from {}: {reason}", .source_path.display())]
    Copy { source_path: PathBuf, reason: String },

    #[error("Asset store error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors that occur while exporting the assembled book
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Errors that occur during output storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}
