//! Policy references cited in generated answers.

use crate::domain::PolicyDomain;
use regex::Regex;
use std::sync::LazyLock;

static DOAD_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:DOAD|DAOD)\s+(\d{4}-\d+)\b").expect("citation regex")
});

/// Extract distinct policy references from an answer, first occurrence first.
///
/// References are normalized to `DOAD NNNN-N`. Consolidated domains have no
/// numbered documents and always return an empty list.
pub fn extract_citations(domain: PolicyDomain, answer: &str) -> Vec<String> {
    if !domain.uses_selector() {
        return Vec::new();
    }

    let mut citations: Vec<String> = Vec::new();
    for captures in DOAD_REFERENCE.captures_iter(answer) {
        let citation = format!("DOAD {}", &captures[1]);
        if !citations.contains(&citation) {
            citations.push(citation);
        }
    }
    citations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_and_normalizes() {
        let answer = "Per DOAD 5019-4, report it. See also daod  5012-0 and DOAD 5019-4.";
        assert_eq!(
            extract_citations(PolicyDomain::Doad, answer),
            vec!["DOAD 5019-4", "DOAD 5012-0"]
        );
    }

    #[test]
    fn test_ignores_unnumbered_mentions() {
        assert!(extract_citations(PolicyDomain::Doad, "The DOAD series covers this.").is_empty());
    }

    #[test]
    fn test_consolidated_domain_has_no_citations() {
        assert!(extract_citations(PolicyDomain::Leave, "Per DOAD 5019-4.").is_empty());
    }
}
