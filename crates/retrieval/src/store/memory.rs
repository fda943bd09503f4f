//! In-memory document store.

use super::{DocumentStore, StorageError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Holds documents in a map. Counts reads so tests can assert which
/// stages touched the store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, String>>,
    failing: RwLock<HashSet<String>>,
    reads: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document (builder style).
    pub fn with_document(self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    pub fn insert(&self, key: impl Into<String>, text: impl Into<String>) {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), text.into());
    }

    /// Make reads of `key` fail with an I/O error.
    pub fn fail_with_io(&self, key: impl Into<String>) {
        self.failing
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into());
    }

    /// Number of `read` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn read(&self, key: &str) -> Result<String, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failing
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(key);
        if failing {
            return Err(StorageError::Io {
                key: key.to_string(),
                message: "simulated read failure".to_string(),
            });
        }

        self.documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_counts() {
        let store = MemoryDocumentStore::new()
            .with_document("doad/B.md", "B")
            .with_document("doad/A.md", "A")
            .with_document("leave/consolidated_policies.md", "L");

        assert_eq!(store.read("doad/A.md").await.unwrap(), "A");
        assert!(store.read("doad/C.md").await.unwrap_err().is_not_found());
        assert_eq!(store.read_count(), 2);

        assert_eq!(
            store.list("doad/").await.unwrap(),
            vec!["doad/A.md", "doad/B.md"]
        );
    }

    #[tokio::test]
    async fn test_simulated_failure() {
        let store = MemoryDocumentStore::new().with_document("doad/A.md", "A");
        store.fail_with_io("doad/A.md");
        assert!(matches!(
            store.read("doad/A.md").await,
            Err(StorageError::Io { .. })
        ));
    }
}
