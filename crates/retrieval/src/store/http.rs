//! HTTP object store backend.
//!
//! Reads documents with `GET {base_url}/{key}` from a bucket exposed over
//! HTTP(S). Plain HTTP has no way to enumerate keys, so `list` reports
//! [`StorageError::Unsupported`].

use super::{DocumentStore, StorageError};
use policyqa_core::{AppError, AppResult};
use reqwest::StatusCode;
use std::time::Duration;

/// Document store backed by an HTTP bucket endpoint.
pub struct HttpDocumentStore {
    /// Base URL, without trailing slash
    base_url: String,

    /// Bearer token, if the bucket is private
    token: Option<String>,

    client: reqwest::Client,
}

impl HttpDocumentStore {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }

    fn io_error(key: &str, message: impl Into<String>) -> StorageError {
        StorageError::Io {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for HttpDocumentStore {
    fn backend_name(&self) -> &str {
        "http"
    }

    async fn read(&self, key: &str) -> Result<String, StorageError> {
        let mut request = self.client.get(self.url_for(key));
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::io_error(key, format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound {
                key: key.to_string(),
            });
        }
        if !status.is_success() {
            return Err(Self::io_error(key, format!("HTTP {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Self::io_error(key, format!("failed to read body: {}", e)))?;

        tracing::debug!(key, bytes = text.len(), "Fetched document");
        Ok(text)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let mut request = self.client.head(self.url_for(key));
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::io_error(key, format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Self::io_error(key, format!("HTTP {}", status))),
        }
    }

    async fn list(&self, _prefix: &str) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Unsupported {
            backend: "http",
            operation: "listing",
        })
    }
}
