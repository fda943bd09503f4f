//! Request validation.
//!
//! Runs before any document read or model call. Checks happen in a fixed
//! order and the first failure wins: domain, empty conversation, then each
//! turn (role, blank content, length), then total length.

use crate::domain::PolicyDomain;
use crate::error::ValidationError;
use crate::types::{QueryRequest, TurnInput};
use chrono::{DateTime, TimeZone, Utc};
use policyqa_prompt::{ConversationTurn, Role};

/// Maximum characters in one turn, measured after trimming.
pub const MAX_TURN_CHARS: usize = 4000;

/// Maximum characters across all turns, measured on the raw text.
pub const MAX_CONVERSATION_CHARS: usize = 20000;

/// Validate a raw request and convert it into typed turns.
pub fn validate_request(
    request: &QueryRequest,
) -> Result<(PolicyDomain, Vec<ConversationTurn>), ValidationError> {
    let domain = PolicyDomain::parse(&request.policy_set)
        .ok_or_else(|| ValidationError::InvalidDomain(request.policy_set.clone()))?;

    if request.messages.is_empty() {
        return Err(ValidationError::EmptyConversation);
    }

    let mut turns = Vec::with_capacity(request.messages.len());
    for (index, message) in request.messages.iter().enumerate() {
        let role = Role::parse(&message.role).ok_or_else(|| ValidationError::InvalidRole {
            index,
            role: message.role.clone(),
        })?;
        check_turn_text(index, &message.content)?;
        turns.push(ConversationTurn::new(
            role,
            message.content.clone(),
            turn_timestamp(message),
        ));
    }

    check_total(request.messages.iter().map(|m| m.content.as_str()))?;

    Ok((domain, turns))
}

/// Validate turns that were already typed by the caller.
pub fn validate_conversation(turns: &[ConversationTurn]) -> Result<(), ValidationError> {
    if turns.is_empty() {
        return Err(ValidationError::EmptyConversation);
    }
    for (index, turn) in turns.iter().enumerate() {
        check_turn_text(index, turn.text())?;
    }
    check_total(turns.iter().map(|t| t.text()))
}

fn check_turn_text(index: usize, text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTurn { index });
    }
    let length = trimmed.chars().count();
    if length > MAX_TURN_CHARS {
        return Err(ValidationError::TurnTooLong {
            index,
            length,
            max: MAX_TURN_CHARS,
        });
    }
    Ok(())
}

fn check_total<'a>(texts: impl Iterator<Item = &'a str>) -> Result<(), ValidationError> {
    let length: usize = texts.map(|t| t.chars().count()).sum();
    if length > MAX_CONVERSATION_CHARS {
        return Err(ValidationError::ConversationTooLong {
            length,
            max: MAX_CONVERSATION_CHARS,
        });
    }
    Ok(())
}

fn turn_timestamp(message: &TurnInput) -> DateTime<Utc> {
    message
        .timestamp
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .unwrap_or_else(Utc::now)
}
