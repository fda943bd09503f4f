//! Document store access.
//!
//! Policy text, instruction templates and catalogs are all plain text blobs
//! addressed by a slash-separated key. The pipeline reads them through
//! [`DocumentStore`]; backends decide where they actually live.

pub mod fs;
pub mod http;
pub mod memory;

pub use fs::FsDocumentStore;
pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;

use policyqa_core::{AppConfig, AppError, AppResult, StorageBackend};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a document could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("document not found: {key}")]
    NotFound { key: String },

    #[error("failed to read {key}: {message}")]
    Io { key: String, message: String },

    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Key-addressed read access to policy text.
///
/// Implementations must be safe to share between concurrent queries.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name used in logs ("fs", "http", "memory").
    fn backend_name(&self) -> &str;

    /// Read the full text stored under `key`.
    async fn read(&self, key: &str) -> Result<String, StorageError>;

    /// Check whether `key` exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.read(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List keys starting with `prefix`, sorted. Backends that cannot
    /// enumerate keys return [`StorageError::Unsupported`].
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Create the document store named by the configuration.
pub fn create_store(config: &AppConfig) -> AppResult<Arc<dyn DocumentStore>> {
    match config.storage.backend {
        StorageBackend::Fs => {
            let root = config.storage.root.as_ref().ok_or_else(|| {
                AppError::Config("Document store directory not configured".to_string())
            })?;
            Ok(Arc::new(FsDocumentStore::new(root)))
        }
        StorageBackend::Http => {
            let base_url = config.storage.base_url.as_deref().ok_or_else(|| {
                AppError::Config("Document store URL not configured".to_string())
            })?;
            let store = HttpDocumentStore::new(
                base_url,
                config.storage_token(),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_fs_store() {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.root = Some(temp.path().to_path_buf());

        let store = create_store(&config).unwrap();
        assert_eq!(store.backend_name(), "fs");
    }

    #[test]
    fn test_create_store_requires_location() {
        let config = AppConfig::default();
        assert!(create_store(&config).is_err());

        let mut http = AppConfig::default();
        http.storage.backend = StorageBackend::Http;
        assert!(create_store(&http).is_err());

        http.storage.base_url = Some("https://bucket.example.com".to_string());
        assert_eq!(create_store(&http).unwrap().backend_name(), "http");
    }

    #[tokio::test]
    async fn test_default_exists_uses_read() {
        let store = MemoryDocumentStore::new().with_document("a.md", "A");
        assert!(store.exists("a.md").await.unwrap());
        assert!(!store.exists("b.md").await.unwrap());

        store.fail_with_io("c.md");
        assert!(store.exists("c.md").await.is_err());
    }
}
