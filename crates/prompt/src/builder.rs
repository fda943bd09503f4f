//! System prompt assembly for the selector and answer stages.

/// Header placed between the answer instructions and the policy text.
pub const POLICY_CONTENT_HEADER: &str = "POLICY CONTENT:";

/// Build the selector system prompt: finder instructions, a blank line, then
/// the domain catalog listing.
pub fn selector_system_prompt(finder_template: &str, catalog: &str) -> String {
    format!("{}\n\n{}", finder_template, catalog)
}

/// Build the answer system prompt.
///
/// Layout is `instructions + "\n\nPOLICY CONTENT:\n" + documents` with the
/// documents separated by blank lines. The instructions are used exactly as
/// stored; brace sequences such as `{{name}}` are not interpreted. With no documents the header is still
/// emitted so the model can see that nothing was retrieved.
pub fn answer_system_prompt(instructions: &str, documents: &[&str]) -> String {
    format!(
        "{}\n\n{}\n{}",
        instructions,
        POLICY_CONTENT_HEADER,
        documents.join("\n\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_system_prompt() {
        let prompt = selector_system_prompt("Find policies.", "| DOAD 5019-4 | Conduct |");
        assert_eq!(prompt, "Find policies.\n\n| DOAD 5019-4 | Conduct |");
    }

    #[test]
    fn test_answer_system_prompt_with_documents() {
        let prompt = answer_system_prompt("Answer briefly.", &["Doc A", "Doc B"]);
        assert_eq!(prompt, "Answer briefly.\n\nPOLICY CONTENT:\nDoc A\n\nDoc B");
    }

    #[test]
    fn test_answer_system_prompt_without_documents() {
        let prompt = answer_system_prompt("Answer briefly.", &[]);
        assert_eq!(prompt, "Answer briefly.\n\nPOLICY CONTENT:\n");
    }

    #[test]
    fn test_instructions_are_not_interpreted() {
        let instructions = "Reply with the form name, e.g. {{FormName}}.\nUse markers like {{#note}} in <b>your</b> answer & cite.";
        let prompt = answer_system_prompt(instructions, &["Leave Policy"]);
        assert_eq!(
            prompt,
            format!("{}\n\nPOLICY CONTENT:\nLeave Policy", instructions)
        );
    }
}
