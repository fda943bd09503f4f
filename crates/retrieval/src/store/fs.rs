//! Local directory document store.

use super::{DocumentStore, StorageError};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Reads documents from a directory tree, one file per key.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Map a key onto a path under the root. Keys that would escape the
    /// root are rejected.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let escapes = relative.components().any(|c| {
            !matches!(c, Component::Normal(_) | Component::CurDir)
        });
        if key.trim().is_empty() || escapes {
            return Err(StorageError::Io {
                key: key.to_string(),
                message: "invalid document key".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl DocumentStore for FsDocumentStore {
    fn backend_name(&self) -> &str {
        "fs"
    }

    async fn read(&self, key: &str) -> Result<String, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                tracing::debug!(key, bytes = text.len(), "Read document");
                Ok(text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(StorageError::Io {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map(|found| found && path.is_file())
            .map_err(|e| StorageError::Io {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let root = self.root.clone();
        let prefix_owned = prefix.to_string();

        let keys = tokio::task::spawn_blocking(move || {
            let mut keys = Vec::new();
            for entry in WalkDir::new(&root)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(&prefix_owned) {
                    keys.push(key);
                }
            }
            keys.sort();
            keys
        })
        .await
        .map_err(|e| StorageError::Io {
            key: prefix.to_string(),
            message: format!("listing task failed: {}", e),
        })?;

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded() -> (TempDir, FsDocumentStore) {
        let temp = TempDir::new().unwrap();
        let prompts = temp.path().join("policy/doad/prompts");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(prompts.join("main.md"), "Answer from policy.").unwrap();
        std::fs::create_dir_all(temp.path().join("doad")).unwrap();
        std::fs::write(temp.path().join("doad/DOAD_5019-4.md"), "Conduct text").unwrap();
        std::fs::write(temp.path().join("doad/DOAD_1000-0.md"), "Framework text").unwrap();
        let store = FsDocumentStore::new(temp.path());
        (temp, store)
    }

    #[tokio::test]
    async fn test_read_and_not_found() {
        let (_temp, store) = seeded();
        assert_eq!(
            store.read("policy/doad/prompts/main.md").await.unwrap(),
            "Answer from policy."
        );
        let err = store.read("doad/DOAD_9999-9.md").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let (_temp, store) = seeded();
        let err = store.read("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(store.read("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_exists() {
        let (_temp, store) = seeded();
        assert!(store.exists("doad/DOAD_5019-4.md").await.unwrap());
        assert!(!store.exists("doad/missing.md").await.unwrap());
        assert!(!store.exists("doad").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let (_temp, store) = seeded();
        let keys = store.list("doad/").await.unwrap();
        assert_eq!(keys, vec!["doad/DOAD_1000-0.md", "doad/DOAD_5019-4.md"]);
        assert_eq!(store.list("").await.unwrap().len(), 3);
    }
}
