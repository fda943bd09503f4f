//! Completion service integration for PolicyQA.
//!
//! This crate defines the contract the query pipeline uses to talk to a
//! chat-completion model and ships the providers that satisfy it.
//!
//! # Providers
//! - **OpenAI-compatible**: OpenRouter (default), OpenAI, Ollama's `/v1` API
//! - **Scripted**: in-process canned replies for tests and offline runs
//!
//! # Example
//! ```no_run
//! use policyqa_llm::{CompletionClient, CompletionRequest, providers::OpenAiCompatClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiCompatClient::openrouter("sk-or-...")?;
//! let request = CompletionRequest::new("What is DOAD 5019-4?", "anthropic/claude-3.5-sonnet")
//!     .with_system("Answer from policy text only.")
//!     .with_temperature(0.1);
//! let response = client.complete(&request).await?;
//! println!("{}", response.first_text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    CompletionChoice, CompletionClient, CompletionRequest, CompletionResponse, UsageMetrics,
};
pub use factory::{create_client, ClientOptions};
pub use providers::{OpenAiCompatClient, ScriptedClient, ScriptedReply};
pub use types::ProviderType;
