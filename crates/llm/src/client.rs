//! Completion client abstraction and request/response types.
//!
//! The query pipeline depends only on [`CompletionClient`]. How the call is
//! transported, authenticated, or rate-limited is the provider's business.

use policyqa_core::AppResult;
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Chat completion request: one system prompt, one user prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g., "anthropic/claude-3.5-sonnet")
    pub model: String,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User prompt
    pub user: String,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a new request with required fields.
    pub fn new(user: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            user: user.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// One generated alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    /// Generated text
    pub text: String,

    /// Why generation stopped, when the provider reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl CompletionChoice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: None,
        }
    }
}

/// Completion response.
///
/// `choices` may be empty; callers decide whether that is fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated alternatives, in provider order
    pub choices: Vec<CompletionChoice>,

    /// Token usage for the call
    pub usage: UsageMetrics,

    /// Model that served the request
    pub model: String,
}

impl CompletionResponse {
    /// Text of the first choice, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.text.as_str())
    }
}

/// Token usage statistics for one model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl UsageMetrics {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

impl Add for UsageMetrics {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

/// Trait for completion providers.
///
/// Implementations must be safe to share between concurrent queries.
/// Dropping the returned future aborts the in-flight call; the pipeline
/// relies on that for cancellation.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Get the provider name (e.g., "openrouter", "scripted").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    ///
    /// Transport failures and non-success statuses are `AppError::Llm`.
    async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("Hello", "model-a")
            .with_system("Be brief")
            .with_temperature(0.1)
            .with_max_tokens(4000);

        assert_eq!(request.user, "Hello");
        assert_eq!(request.model, "model-a");
        assert_eq!(request.system.as_deref(), Some("Be brief"));
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, Some(4000));
    }

    #[test]
    fn test_usage_addition() {
        let total = UsageMetrics::new(100, 20) + UsageMetrics::new(50, 5);
        assert_eq!(total, UsageMetrics::new(150, 25));
        assert_eq!(total.total_tokens, 175);
    }

    #[test]
    fn test_first_text() {
        let response = CompletionResponse {
            choices: vec![CompletionChoice::new("one"), CompletionChoice::new("two")],
            usage: UsageMetrics::default(),
            model: "m".to_string(),
        };
        assert_eq!(response.first_text(), Some("one"));

        let empty = CompletionResponse {
            choices: Vec::new(),
            ..response
        };
        assert_eq!(empty.first_text(), None);
    }
}
