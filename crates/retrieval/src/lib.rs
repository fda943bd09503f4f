//! Policy question answering pipeline.
//!
//! A query runs in two model stages. For domains with many documents a
//! selector ("finder") model names the relevant policies from a catalog and
//! their text is read from the document store. Domains with a single
//! consolidated document skip the selector. An answer ("main") model then
//! replies using only the retrieved text.
//!
//! # Example
//! ```no_run
//! use policyqa_core::AppConfig;
//! use policyqa_retrieval::{QueryRequest, QueryRouter, TurnInput};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let router = QueryRouter::from_config(&config)?;
//! let request = QueryRequest {
//!     messages: vec![TurnInput::new("user", "How do I request leave?")],
//!     policy_set: "LEAVE".to_string(),
//! };
//! let result = router.process(&request, &CancellationToken::new()).await?;
//! println!("{}", result.answer());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
mod cancel;
pub mod citations;
pub mod domain;
pub mod error;
pub mod generator;
pub mod parser;
pub mod router;
pub mod selector;
pub mod store;
pub mod strategy;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;

// Re-export main types
pub use assembler::PolicyContentAssembler;
pub use citations::extract_citations;
pub use domain::{PolicyDomain, RetrievalLayout, DOCUMENT_EXTENSION};
pub use error::{QueryError, Stage, ValidationError};
pub use generator::AnswerGenerator;
pub use parser::{KeywordLineParser, ResponseParser};
pub use router::{QueryRouter, RouterSettings};
pub use selector::PolicySelector;
pub use store::{
    create_store, DocumentStore, FsDocumentStore, HttpDocumentStore, MemoryDocumentStore,
    StorageError,
};
pub use strategy::RetrievalStrategy;
pub use types::{
    PolicyIdentifier, QueryRequest, QueryResult, RetrievedContext, RetrievedDocument, StageUsage,
    TurnInput,
};
pub use validation::{MAX_CONVERSATION_CHARS, MAX_TURN_CHARS};
