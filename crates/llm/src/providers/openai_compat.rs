//! OpenAI-compatible chat completion provider.
//!
//! Works with OpenRouter (default), OpenAI, and Ollama's `/v1` endpoint.
//! API: `POST {base_url}/chat/completions`

use crate::client::{
    CompletionChoice, CompletionClient, CompletionRequest, CompletionResponse, UsageMetrics,
};
use policyqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Chat completions response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// OpenAI-compatible completion client.
pub struct OpenAiCompatClient {
    /// Provider name used in logs
    name: String,

    /// Base URL, without trailing slash
    base_url: String,

    /// Bearer token, if the endpoint needs one
    api_key: Option<String>,

    /// `X-Title` attribution header
    app_title: Option<String>,

    /// `HTTP-Referer` attribution header
    app_referer: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a client for any OpenAI-compatible endpoint.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            app_title: None,
            app_referer: None,
            client,
        })
    }

    /// Create an OpenRouter client with a 60 second timeout.
    pub fn openrouter(api_key: impl Into<String>) -> AppResult<Self> {
        Self::new(
            "openrouter",
            OPENROUTER_BASE_URL,
            Some(api_key.into()),
            Duration::from_secs(60),
        )
    }

    /// Set the attribution headers OpenRouter shows on its dashboard.
    pub fn with_attribution(mut self, title: Option<String>, referer: Option<String>) -> Self {
        self.app_title = title;
        self.app_referer = referer;
        self
    }

    /// Convert a CompletionRequest to the chat completions body.
    fn to_chat_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.user.clone(),
        });

        ChatRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    /// Convert the chat completions body to a CompletionResponse.
    fn convert_response(&self, response: ChatResponse, requested_model: &str) -> CompletionResponse {
        let choices = response
            .choices
            .into_iter()
            .map(|choice| CompletionChoice {
                text: choice.message.content.unwrap_or_default(),
                finish_reason: choice.finish_reason,
            })
            .collect();

        let usage = response
            .usage
            .map(|u| UsageMetrics {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        CompletionResponse {
            choices,
            usage,
            model: response
                .model
                .unwrap_or_else(|| requested_model.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiCompatClient {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse> {
        tracing::debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let body = self.to_chat_request(request);
        let url = format!("{}/chat/completions", self.base_url);

        let mut http_request = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            http_request = http_request.bearer_auth(key);
        }
        if let Some(ref title) = self.app_title {
            http_request = http_request.header("X-Title", title);
        }
        if let Some(ref referer) = self.app_referer {
            http_request = http_request.header("HTTP-Referer", referer);
        }

        let response = http_request.send().await.map_err(|e| {
            AppError::Llm(format!("Failed to send request to {}: {}", self.name, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(provider = %self.name, %status, "Completion request rejected");
            return Err(AppError::Llm(format!(
                "{} API error ({}): {}",
                self.name, status, error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            AppError::Llm(format!("Failed to parse {} response: {}", self.name, e))
        })?;

        tracing::debug!(
            provider = %self.name,
            choices = chat_response.choices.len(),
            "Received completion"
        );

        Ok(self.convert_response(chat_response, &request.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiCompatClient {
        OpenAiCompatClient::new(
            "openrouter",
            "https://openrouter.ai/api/v1/",
            Some("sk-test".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.provider_name(), "openrouter");
        assert_eq!(client.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_chat_request_conversion() {
        let request = CompletionRequest::new("User: hi", "model-a")
            .with_system("You find policies")
            .with_temperature(0.1)
            .with_max_tokens(4000);

        let body = client().to_chat_request(&request);
        assert_eq!(body.model, "model-a");
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].role, "user");
        assert_eq!(body.messages[1].content, "User: hi");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 4000);
    }

    #[test]
    fn test_chat_request_without_system() {
        let request = CompletionRequest::new("hi", "model-a");
        let body = client().to_chat_request(&request);
        assert_eq!(body.messages.len(), 1);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_conversion() {
        let raw = r#"{
            "id": "gen-1",
            "model": "anthropic/claude-3.5-sonnet",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "DOAD 5019-4"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 120, "completion_tokens": 8, "total_tokens": 128}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = client().convert_response(parsed, "fallback");

        assert_eq!(response.first_text(), Some("DOAD 5019-4"));
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage, UsageMetrics::new(120, 8));
        assert_eq!(response.model, "anthropic/claude-3.5-sonnet");
    }

    #[test]
    fn test_response_without_choices_or_usage() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let response = client().convert_response(parsed, "model-a");
        assert!(response.choices.is_empty());
        assert_eq!(response.usage, UsageMetrics::default());
        assert_eq!(response.model, "model-a");
    }
}
