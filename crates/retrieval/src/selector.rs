//! Selector ("finder") stage.

use crate::cancel::guarded;
use crate::error::{QueryError, Stage};
use crate::parser::ResponseParser;
use crate::types::PolicyIdentifier;
use policyqa_llm::{CompletionClient, CompletionRequest, UsageMetrics};
use policyqa_prompt::{render_conversation, selector_system_prompt, ConversationTurn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Asks the selector model which documents in a catalog are relevant.
#[derive(Clone)]
pub struct PolicySelector {
    client: Arc<dyn CompletionClient>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    parser: Arc<dyn ResponseParser>,
    max_policies: Option<usize>,
}

impl PolicySelector {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        model: impl Into<String>,
        parser: Arc<dyn ResponseParser>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.1,
            max_tokens: None,
            parser,
            max_policies: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Keep at most this many identifiers, in response order.
    pub fn with_max_policies(mut self, max_policies: Option<usize>) -> Self {
        self.max_policies = max_policies;
        self
    }

    /// Name the relevant documents for a conversation.
    ///
    /// The system prompt is the finder instructions followed by the catalog;
    /// the user prompt is the rendered conversation. Identifiers come back in
    /// the order the model listed them. Zero identifiers is not an error.
    pub async fn select_policies(
        &self,
        conversation: &[ConversationTurn],
        finder_instructions: &str,
        catalog: &str,
        cancel: &CancellationToken,
    ) -> Result<(Vec<PolicyIdentifier>, UsageMetrics), QueryError> {
        let mut request = CompletionRequest::new(render_conversation(conversation), &self.model)
            .with_system(selector_system_prompt(finder_instructions, catalog))
            .with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = guarded(cancel, Stage::Selector, self.client.complete(&request))
            .await?
            .map_err(|source| QueryError::Upstream {
                stage: Stage::Selector,
                source,
            })?;

        let text = response.first_text().ok_or(QueryError::NoSelectorResponse)?;
        let mut identifiers = self.parser.parse(text);

        if let Some(limit) = self.max_policies {
            if identifiers.len() > limit {
                tracing::debug!(
                    parsed = identifiers.len(),
                    limit,
                    "Truncating selected policies"
                );
                identifiers.truncate(limit);
            }
        }

        tracing::info!(
            model = %self.model,
            count = identifiers.len(),
            tokens = response.usage.total_tokens,
            "Selected policies"
        );

        Ok((identifiers, response.usage))
    }
}
