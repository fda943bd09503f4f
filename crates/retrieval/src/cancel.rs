//! Cancellation-aware wrappers for external calls.

use crate::error::{QueryError, Stage};
use crate::store::DocumentStore;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run `fut` unless `cancel` fires first.
///
/// A token that is already cancelled short-circuits without polling `fut`,
/// so no external call is started after cancellation.
pub(crate) async fn guarded<F, T>(
    cancel: &CancellationToken,
    stage: Stage,
    fut: F,
) -> Result<T, QueryError>
where
    F: Future<Output = T>,
{
    if cancel.is_cancelled() {
        return Err(QueryError::Cancelled { stage });
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(stage = %stage, "Query cancelled");
            Err(QueryError::Cancelled { stage })
        }
        value = fut => Ok(value),
    }
}

/// Read a document every query in the domain needs. Any failure is fatal.
pub(crate) async fn read_required(
    store: &dyn DocumentStore,
    key: &str,
    stage: Stage,
    cancel: &CancellationToken,
) -> Result<String, QueryError> {
    guarded(cancel, stage, store.read(key))
        .await?
        .map_err(|source| QueryError::PromptUnavailable {
            stage,
            key: key.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use std::time::Duration;

    #[tokio::test]
    async fn test_already_cancelled_skips_future() {
        let token = CancellationToken::new();
        token.cancel();
        let store = MemoryDocumentStore::new().with_document("a.md", "A");

        let result = read_required(&store, "a.md", Stage::Catalog, &token).await;
        assert!(matches!(
            result,
            Err(QueryError::Cancelled {
                stage: Stage::Catalog
            })
        ));
        assert_eq!(store.read_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = guarded(
            &token,
            Stage::Generator,
            tokio::time::sleep(Duration::from_secs(30)),
        )
        .await;
        assert!(matches!(result, Err(QueryError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn test_missing_required_document() {
        let token = CancellationToken::new();
        let store = MemoryDocumentStore::new();
        let err = read_required(&store, "policy/doad/prompts/main.md", Stage::Instructions, &token)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::PromptUnavailable {
                stage: Stage::Instructions,
                ..
            }
        ));
    }
}
