//! Resource store abstraction
//!
//! This module defines the [`ResourceStore`] trait every store backend implements
//! and the [`Resource`] handle it hands out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Import failed: {0}")]
    ImportFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid resource key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to an imported resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Store-internal key, see the crate documentation for the format
    pub key: String,
    /// Hex SHA-256 of the resource bytes
    pub content_hash: String,
    pub filename: String,
    pub collection: String,
    pub size_bytes: u64,
}

impl Resource {
    /// Lowercase file extension of the resource filename, empty when there is none
    pub fn file_extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    /// Identity used for the image size cache
    pub fn cache_identity(&self) -> &str {
        &self.content_hash
    }
}

/// Resource store abstraction trait
///
/// The image service only ever talks to stores through this trait, so the
/// persistence mechanism behind it is free to change.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Import bytes into `collection` under the given filename
    async fn import(&self, data: Vec<u8>, filename: &str, collection: &str)
        -> StoreResult<Resource>;

    /// Import the contents of a local file
    async fn import_file(
        &self,
        path: &Path,
        filename: &str,
        collection: &str,
    ) -> StoreResult<Resource>;

    /// Materialize the resource on the local filesystem and return its path
    async fn create_temporary_local_copy(&self, resource: &Resource) -> StoreResult<PathBuf>;

    /// Read the full resource content
    async fn read(&self, resource: &Resource) -> StoreResult<Vec<u8>>;

    /// Check whether the resource content is present
    async fn exists(&self, resource: &Resource) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(filename: &str) -> Resource {
        Resource {
            key: "resources/ab/abcdef".to_string(),
            content_hash: "abcdef".to_string(),
            filename: filename.to_string(),
            collection: "persistent".to_string(),
            size_bytes: 10,
        }
    }

    #[test]
    fn test_file_extension_is_lowercased() {
        assert_eq!(resource("Photo.GIF").file_extension(), "gif");
        assert_eq!(resource("archive.tar.gz").file_extension(), "gz");
        assert_eq!(resource("README").file_extension(), "");
    }

    #[test]
    fn test_cache_identity_is_content_hash() {
        assert_eq!(resource("a.png").cache_identity(), "abcdef");
    }
}
