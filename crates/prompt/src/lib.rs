//! Prompt construction for PolicyQA.
//!
//! This crate provides:
//! - Conversation turn types (`ConversationTurn`, `Role`)
//! - Conversation rendering for the user prompt of both model stages
//! - System prompt assembly for the selector and answer stages

pub mod builder;
pub mod conversation;
pub mod types;

// Re-export main types
pub use builder::{answer_system_prompt, selector_system_prompt, POLICY_CONTENT_HEADER};
pub use conversation::render_conversation;
pub use types::{ConversationTurn, Role};
