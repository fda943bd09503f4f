//! Policy text assembly.

use crate::cancel::guarded;
use crate::domain::PolicyDomain;
use crate::error::{QueryError, Stage};
use crate::store::DocumentStore;
use crate::types::{PolicyIdentifier, RetrievedDocument};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Reads policy documents from the store.
#[derive(Clone)]
pub struct PolicyContentAssembler {
    store: Arc<dyn DocumentStore>,
}

impl PolicyContentAssembler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Read the documents for `identifiers`, in order.
    ///
    /// Best effort: a document that is missing or fails to read is logged and
    /// skipped. An empty result is not an error. Only cancellation aborts.
    pub async fn assemble(
        &self,
        domain: PolicyDomain,
        identifiers: &[PolicyIdentifier],
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievedDocument>, QueryError> {
        let mut documents = Vec::with_capacity(identifiers.len());

        for identifier in identifiers {
            let Some(key) = domain.document_key(identifier) else {
                tracing::warn!(domain = %domain, "Domain has no per-document layout");
                break;
            };

            match guarded(cancel, Stage::Assembly, self.store.read(&key)).await? {
                Ok(text) => documents.push(RetrievedDocument {
                    identifier: Some(identifier.clone()),
                    key,
                    text,
                }),
                Err(e) => {
                    tracing::warn!(
                        identifier = %identifier,
                        key = %key,
                        error = %e,
                        "Skipping unavailable policy document"
                    );
                }
            }
        }

        tracing::debug!(
            requested = identifiers.len(),
            read = documents.len(),
            "Assembled policy content"
        );

        Ok(documents)
    }

    /// Read a domain's single consolidated document. Any failure is fatal.
    pub async fn read_consolidated(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<RetrievedDocument, QueryError> {
        let text = guarded(cancel, Stage::Consolidated, self.store.read(key))
            .await?
            .map_err(|source| QueryError::ConsolidatedDocumentUnavailable {
                key: key.to_string(),
                source,
            })?;

        Ok(RetrievedDocument {
            identifier: None,
            key: key.to_string(),
            text,
        })
    }
}
