//! Retrieval strategies.
//!
//! Each domain fetches its policy text one of two ways. The router only
//! sees [`RetrievalStrategy::fetch_context`].

use crate::assembler::PolicyContentAssembler;
use crate::cancel::read_required;
use crate::domain::{PolicyDomain, RetrievalLayout};
use crate::error::{QueryError, Stage};
use crate::selector::PolicySelector;
use crate::store::DocumentStore;
use crate::types::RetrievedContext;
use policyqa_prompt::ConversationTurn;
use tokio_util::sync::CancellationToken;

/// How one query obtains its policy documents.
pub enum RetrievalStrategy<'a> {
    /// Selector picks documents from the catalog, then each is read best effort.
    Dynamic {
        domain: PolicyDomain,
        finder_key: &'static str,
        catalog_key: &'static str,
        store: &'a dyn DocumentStore,
        selector: &'a PolicySelector,
        assembler: &'a PolicyContentAssembler,
    },
    /// One well-known document holds all policy text.
    Consolidated {
        key: &'static str,
        assembler: &'a PolicyContentAssembler,
    },
}

impl<'a> RetrievalStrategy<'a> {
    /// Pick the strategy matching a domain's layout.
    pub fn for_domain(
        domain: PolicyDomain,
        store: &'a dyn DocumentStore,
        selector: &'a PolicySelector,
        assembler: &'a PolicyContentAssembler,
    ) -> Self {
        match domain.layout() {
            RetrievalLayout::PerDocument {
                finder, catalog, ..
            } => Self::Dynamic {
                domain,
                finder_key: finder,
                catalog_key: catalog,
                store,
                selector,
                assembler,
            },
            RetrievalLayout::Consolidated { document } => Self::Consolidated {
                key: document,
                assembler,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dynamic { .. } => "dynamic",
            Self::Consolidated { .. } => "consolidated",
        }
    }

    /// Fetch the documents for a conversation.
    pub async fn fetch_context(
        &self,
        conversation: &[ConversationTurn],
        cancel: &CancellationToken,
    ) -> Result<RetrievedContext, QueryError> {
        match self {
            Self::Dynamic {
                domain,
                finder_key,
                catalog_key,
                store,
                selector,
                assembler,
            } => {
                let finder = read_required(*store, finder_key, Stage::Finder, cancel).await?;
                let catalog = read_required(*store, catalog_key, Stage::Catalog, cancel).await?;

                let (identifiers, usage) = selector
                    .select_policies(conversation, &finder, &catalog, cancel)
                    .await?;

                if identifiers.is_empty() {
                    tracing::warn!(
                        domain = %domain,
                        "Selector named no policies; answering without policy content"
                    );
                }

                let documents = assembler.assemble(*domain, &identifiers, cancel).await?;

                Ok(RetrievedContext {
                    documents,
                    selector_usage: Some(usage),
                })
            }
            Self::Consolidated { key, assembler } => {
                let document = assembler.read_consolidated(key, cancel).await?;
                Ok(RetrievedContext {
                    documents: vec![document],
                    selector_usage: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::KeywordLineParser;
    use crate::store::MemoryDocumentStore;
    use policyqa_llm::{ScriptedClient, UsageMetrics};
    use std::sync::Arc;

    fn parts(
        store: Arc<MemoryDocumentStore>,
        client: Arc<ScriptedClient>,
    ) -> (PolicySelector, PolicyContentAssembler) {
        let selector = PolicySelector::new(
            client,
            "selector",
            Arc::new(KeywordLineParser::new(["DOAD"])),
        );
        (selector, PolicyContentAssembler::new(store))
    }

    #[tokio::test]
    async fn test_dynamic_strategy() {
        let store = Arc::new(
            MemoryDocumentStore::new()
                .with_document("policy/doad/prompts/finder.md", "Find.")
                .with_document("policy/doad/prompts/DOAD-list-table.md", "catalog")
                .with_document("doad/DOAD_5019-4.md", "Conduct"),
        );
        let client = Arc::new(
            ScriptedClient::always("DOAD 5019-4\nDOAD 7000-1").with_usage(UsageMetrics::new(50, 5)),
        );
        let (selector, assembler) = parts(store.clone(), client);

        let strategy =
            RetrievalStrategy::for_domain(PolicyDomain::Doad, store.as_ref(), &selector, &assembler);
        assert_eq!(strategy.name(), "dynamic");

        let context = strategy
            .fetch_context(&[ConversationTurn::user("conduct?")], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(context.documents.len(), 1);
        assert_eq!(context.selector_usage, Some(UsageMetrics::new(50, 5)));
    }

    #[tokio::test]
    async fn test_missing_catalog_is_fatal() {
        let store = Arc::new(
            MemoryDocumentStore::new().with_document("policy/doad/prompts/finder.md", "Find."),
        );
        let client = Arc::new(ScriptedClient::always("DOAD 1"));
        let (selector, assembler) = parts(store.clone(), client.clone());

        let err =
            RetrievalStrategy::for_domain(PolicyDomain::Doad, store.as_ref(), &selector, &assembler)
                .fetch_context(&[ConversationTurn::user("q")], &CancellationToken::new())
                .await
                .unwrap_err();
        assert!(matches!(
            err,
            QueryError::PromptUnavailable {
                stage: Stage::Catalog,
                ..
            }
        ));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_finder_is_tagged_finder() {
        let store = Arc::new(
            MemoryDocumentStore::new()
                .with_document("policy/doad/prompts/DOAD-list-table.md", "| DOAD 1 |"),
        );
        let client = Arc::new(ScriptedClient::always("DOAD 1"));
        let (selector, assembler) = parts(store.clone(), client.clone());

        let err =
            RetrievalStrategy::for_domain(PolicyDomain::Doad, store.as_ref(), &selector, &assembler)
                .fetch_context(&[ConversationTurn::user("q")], &CancellationToken::new())
                .await
                .unwrap_err();
        assert!(matches!(
            err,
            QueryError::PromptUnavailable {
                stage: Stage::Finder,
                ref key,
                ..
            } if key == "policy/doad/prompts/finder.md"
        ));
        assert!(err.to_string().starts_with("finder stage"));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_consolidated_strategy_skips_selector() {
        let store = Arc::new(
            MemoryDocumentStore::new()
                .with_document("leave/consolidated_policies.md", "Leave Policy: ..."),
        );
        let client = Arc::new(ScriptedClient::always("unused"));
        let (selector, assembler) = parts(store.clone(), client.clone());

        let context =
            RetrievalStrategy::for_domain(PolicyDomain::Leave, store.as_ref(), &selector, &assembler)
                .fetch_context(&[ConversationTurn::user("q")], &CancellationToken::new())
                .await
                .unwrap();

        assert_eq!(context.documents[0].text, "Leave Policy: ...");
        assert_eq!(context.selector_usage, None);
        assert_eq!(client.call_count(), 0);
    }
}
