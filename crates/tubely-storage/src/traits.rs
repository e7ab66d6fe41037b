//! Storage abstraction trait

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Objects are written once under a caller-generated key and never overwritten.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream the file at `path` to `key`, recording content type and length.
    ///
    /// Returns the public URL of the stored object. Any transport or backend
    /// failure is returned as-is; nothing is retried.
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
        content_length: u64,
    ) -> StorageResult<String>;

    /// Public URL for `key`; does not check that the object exists
    fn object_url(&self, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
