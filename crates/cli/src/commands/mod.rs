//! Command handlers for the PolicyQA CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod check;
pub mod domains;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use check::CheckCommand;
pub use domains::DomainsCommand;

use policyqa_llm::UsageMetrics;
use policyqa_retrieval::QueryResult;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cancellation for one query: fires on Ctrl-C or when the optional
/// deadline passes. Dropping it stops the watcher task.
pub(crate) struct QueryCancellation {
    token: CancellationToken,
}

impl QueryCancellation {
    pub(crate) fn start(timeout_secs: Option<u64>) -> Self {
        let token = CancellationToken::new();
        let trigger = token.clone();

        tokio::spawn(async move {
            let deadline = async {
                match timeout_secs {
                    Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = trigger.cancelled() => return,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("Interrupted, cancelling query");
                }
                _ = deadline => {
                    tracing::warn!(timeout_secs = ?timeout_secs, "Query deadline reached, cancelling");
                }
            }
            trigger.cancel();
        });

        Self { token }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for QueryCancellation {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

fn usage_json(usage: &UsageMetrics) -> serde_json::Value {
    serde_json::json!({
        "promptTokens": usage.prompt_tokens,
        "completionTokens": usage.completion_tokens,
        "totalTokens": usage.total_tokens
    })
}

/// Structured output for one answered query.
pub(crate) fn result_json(result: &QueryResult, provider: &str) -> serde_json::Value {
    serde_json::json!({
        "message": result.answer(),
        "timestamp": result.timestamp().to_rfc3339(),
        "domain": result.domain().as_str(),
        "provider": provider,
        "usage": {
            "finder": result.selector_usage().as_ref().map(usage_json),
            "main": usage_json(&result.generator_usage()),
            "total": usage_json(&result.total_usage())
        },
        "citations": result.citations(),
        "sources": result.sources()
    })
}

/// Log per-stage token usage at debug level.
pub(crate) fn log_usage(result: &QueryResult) {
    if let Some(usage) = result.selector_usage() {
        tracing::debug!(
            "Finder tokens - Prompt: {}, Completion: {}, Total: {}",
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens
        );
    }
    let usage = result.generator_usage();
    tracing::debug!(
        "Answer tokens - Prompt: {}, Completion: {}, Total: {}",
        usage.prompt_tokens,
        usage.completion_tokens,
        usage.total_tokens
    );
}
