//! Answer ("main") stage.

use crate::cancel::guarded;
use crate::error::{QueryError, Stage};
use crate::types::RetrievedDocument;
use policyqa_llm::{CompletionClient, CompletionRequest, UsageMetrics};
use policyqa_prompt::{answer_system_prompt, render_conversation, ConversationTurn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Produces the final answer from instructions, policy text and the
/// conversation.
#[derive(Clone)]
pub struct AnswerGenerator {
    client: Arc<dyn CompletionClient>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl AnswerGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.1,
            max_tokens: None,
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

    /// Generate an answer. Exactly one model call; never retried.
    pub async fn generate(
        &self,
        conversation: &[ConversationTurn],
        instructions: &str,
        documents: &[RetrievedDocument],
        cancel: &CancellationToken,
    ) -> Result<(String, UsageMetrics), QueryError> {
        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();

        let mut request = CompletionRequest::new(render_conversation(conversation), &self.model)
            .with_system(answer_system_prompt(instructions, &texts))
            .with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = guarded(cancel, Stage::Generator, self.client.complete(&request))
            .await?
            .map_err(|source| QueryError::Upstream {
                stage: Stage::Generator,
                source,
            })?;

        let answer = response
            .first_text()
            .ok_or(QueryError::NoGeneratorResponse)?
            .to_string();

        tracing::info!(
            model = %self.model,
            documents = documents.len(),
            tokens = response.usage.total_tokens,
            "Generated answer"
        );

        Ok((answer, response.usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyqa_llm::{ScriptedClient, ScriptedReply};

    fn doc(text: &str) -> RetrievedDocument {
        RetrievedDocument {
            identifier: None,
            key: "k".to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_prompt_layout() {
        let client = Arc::new(
            ScriptedClient::always("Submit the request to your CO.")
                .with_usage(UsageMetrics::new(900, 12)),
        );
        let generator = AnswerGenerator::new(client.clone(), "claude-3-5-sonnet");
        let conversation = vec![
            ConversationTurn::user("How do I request leave?"),
            ConversationTurn::assistant("Which type?"),
            ConversationTurn::user("Annual."),
        ];

        let (answer, usage) = generator
            .generate(
                &conversation,
                "Answer from policy.",
                &[doc("Doc A"), doc("Doc B")],
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(answer, "Submit the request to your CO.");
        assert_eq!(usage.total_tokens, 912);

        let request = &client.requests()[0];
        assert_eq!(request.model, "claude-3-5-sonnet");
        assert_eq!(
            request.system.as_deref(),
            Some("Answer from policy.\n\nPOLICY CONTENT:\nDoc A\n\nDoc B")
        );
        assert_eq!(
            request.user,
            "User: How do I request leave?\n\nAssistant: Which type?\n\nUser: Annual."
        );
    }

    #[tokio::test]
    async fn test_no_choices() {
        let client = Arc::new(ScriptedClient::new(vec![ScriptedReply::NoChoices]));
        let err = AnswerGenerator::new(client, "m")
            .generate(&[ConversationTurn::user("hi")], "i", &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::NoGeneratorResponse));
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let client = Arc::new(ScriptedClient::new(vec![ScriptedReply::Error(
            "connection reset".to_string(),
        )]));
        let err = AnswerGenerator::new(client, "m")
            .generate(&[ConversationTurn::user("hi")], "i", &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Generator));
        assert!(err.to_string().contains("connection reset"));
    }
}
