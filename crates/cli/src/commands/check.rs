//! Check command handler.
//!
//! Reports whether the configuration is usable, whether the document store
//! holds every fixed document each policy set reads, and how many policy
//! documents each per-document policy set has.

use clap::Args;
use policyqa_core::{config::AppConfig, AppError, AppResult};
use policyqa_retrieval::{
    create_store, DocumentStore, PolicyDomain, RetrievalLayout, DOCUMENT_EXTENSION,
};

/// Check configuration and document store layout
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Presence of one required store key.
#[derive(Debug)]
struct KeyStatus {
    domain: PolicyDomain,
    key: &'static str,
    present: bool,
    error: Option<String>,
}

async fn check_keys(store: &dyn DocumentStore) -> Vec<KeyStatus> {
    let mut statuses = Vec::new();
    for domain in PolicyDomain::ALL {
        for key in domain.required_keys() {
            let (present, error) = match store.exists(key).await {
                Ok(present) => (present, None),
                Err(e) => (false, Some(e.to_string())),
            };
            statuses.push(KeyStatus {
                domain,
                key,
                present,
                error,
            });
        }
    }
    statuses
}

/// Number of policy documents stored for one per-document domain.
#[derive(Debug)]
struct DocumentCount {
    domain: PolicyDomain,
    directory: &'static str,
    /// `None` when the store cannot list keys
    count: Option<usize>,
    error: Option<String>,
}

async fn count_documents(store: &dyn DocumentStore) -> Vec<DocumentCount> {
    let mut counts = Vec::new();
    for domain in PolicyDomain::ALL {
        let RetrievalLayout::PerDocument { directory, .. } = domain.layout() else {
            continue;
        };
        let suffix = format!(".{}", DOCUMENT_EXTENSION);
        let (count, error) = match store.list(&format!("{}/", directory)).await {
            Ok(keys) => (
                Some(keys.iter().filter(|k| k.ends_with(&suffix)).count()),
                None,
            ),
            Err(e) if e.is_unsupported() => {
                tracing::debug!("Skipping document count: {}", e);
                (None, None)
            }
            Err(e) => (None, Some(e.to_string())),
        };
        counts.push(DocumentCount {
            domain,
            directory,
            count,
            error,
        });
    }
    counts
}

impl CheckCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing check command");

        let config_error = config.validate().err();

        let (keys, counts) = match create_store(config) {
            Ok(store) => (
                check_keys(store.as_ref()).await,
                count_documents(store.as_ref()).await,
            ),
            Err(e) => {
                tracing::debug!("Document store unavailable: {}", e);
                (Vec::new(), Vec::new())
            }
        };
        let missing = keys.iter().filter(|k| !k.present).count();

        if self.json {
            let output = serde_json::json!({
                "configured": config_error.is_none(),
                "configError": config_error.as_ref().map(|e| e.to_string()),
                "provider": config.provider,
                "selectorModel": config.selector_model,
                "answerModel": config.answer_model,
                "apiKeyPresent": config.api_key.is_some(),
                "storage": {
                    "backend": config.storage.backend,
                    "root": config.storage.root,
                    "baseUrl": config.storage.base_url
                },
                "keys": keys.iter().map(|k| serde_json::json!({
                    "domain": k.domain.as_str(),
                    "key": k.key,
                    "present": k.present,
                    "error": k.error
                })).collect::<Vec<_>>(),
                "documents": counts.iter().map(|c| serde_json::json!({
                    "domain": c.domain.as_str(),
                    "directory": c.directory,
                    "count": c.count,
                    "error": c.error
                })).collect::<Vec<_>>()
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Provider:       {}", config.provider);
            println!("Selector model: {}", config.selector_model);
            println!("Answer model:   {}", config.answer_model);
            println!(
                "API key:        {}",
                if config.api_key.is_some() { "set" } else { "not set" }
            );
            println!();
            for status in &keys {
                let mark = if status.present { "ok" } else { "missing" };
                match status.error {
                    Some(ref error) => println!(
                        "[{:<7}] {:<5} {} ({})",
                        mark, status.domain.as_str(), status.key, error
                    ),
                    None => println!("[{:<7}] {:<5} {}", mark, status.domain.as_str(), status.key),
                }
            }
            for count in &counts {
                let summary = match (count.count, &count.error) {
                    (Some(n), _) => format!("{} document(s)", n),
                    (None, Some(error)) => format!("listing failed ({})", error),
                    (None, None) => "listing not supported by this store".to_string(),
                };
                println!(
                    "[{:<7}] {:<5} {}/: {}",
                    "docs",
                    count.domain.as_str(),
                    count.directory,
                    summary
                );
            }
            if let Some(ref error) = config_error {
                println!();
                println!("{}", error);
            }
        }

        if let Some(error) = config_error {
            return Err(error);
        }
        if missing > 0 {
            return Err(AppError::Storage(format!(
                "{} required document(s) missing from the store",
                missing
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyqa_retrieval::{HttpDocumentStore, MemoryDocumentStore};
    use std::time::Duration;

    #[tokio::test]
    async fn test_check_keys_reports_missing() {
        let store = MemoryDocumentStore::new()
            .with_document("policy/leave/prompts/main.md", "Answer.")
            .with_document("leave/consolidated_policies.md", "Leave Policy");

        let statuses = check_keys(&store).await;
        assert_eq!(statuses.len(), 5);

        let missing: Vec<_> = statuses
            .iter()
            .filter(|s| !s.present)
            .map(|s| s.key)
            .collect();
        assert_eq!(
            missing,
            vec![
                "policy/doad/prompts/main.md",
                "policy/doad/prompts/finder.md",
                "policy/doad/prompts/DOAD-list-table.md",
            ]
        );
    }

    #[tokio::test]
    async fn test_count_documents() {
        let store = MemoryDocumentStore::new()
            .with_document("policy/doad/prompts/main.md", "Answer.")
            .with_document("doad/DOAD_5019-1.md", "A")
            .with_document("doad/DOAD_5012-0.md", "B")
            .with_document("doad/README.txt", "not a policy")
            .with_document("leave/consolidated_policies.md", "Leave Policy");

        let counts = count_documents(&store).await;
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].domain, PolicyDomain::Doad);
        assert_eq!(counts[0].directory, "doad");
        assert_eq!(counts[0].count, Some(2));
        assert_eq!(counts[0].error, None);
    }

    #[tokio::test]
    async fn test_count_documents_without_listing() {
        let store =
            HttpDocumentStore::new("https://bucket.example.com", None, Duration::from_secs(5))
                .unwrap();

        let counts = count_documents(&store).await;
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].count, None);
        assert_eq!(counts[0].error, None);
    }
}
