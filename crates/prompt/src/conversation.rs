//! Conversation rendering.

use crate::types::ConversationTurn;

/// Render a conversation as the user prompt for a model stage.
///
/// Each turn becomes `"<Role>: <text>"`; turns are separated by a blank line
/// and kept in their original order. An empty conversation renders to an
/// empty string.
pub fn render_conversation(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role().label(), turn.text()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
