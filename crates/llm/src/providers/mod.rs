//! Completion provider implementations.

pub mod openai_compat;
pub mod scripted;

pub use openai_compat::OpenAiCompatClient;
pub use scripted::{ScriptedClient, ScriptedReply};
