//! Policy domains and their document store layout.
//!
//! The set of domains is closed. Each domain fixes where its answer
//! instructions live and how its policy text is retrieved. Key paths are
//! shared with the existing policy bucket and must not change.

use crate::types::PolicyIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extension of per-document policy files.
pub const DOCUMENT_EXTENSION: &str = "md";

/// A supported policy set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyDomain {
    /// Defence Administrative Orders and Directives, looked up per document
    Doad,
    /// Leave policy, answered from one consolidated document
    Leave,
}

/// How a domain's policy text is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalLayout {
    /// A selector model picks documents from a catalog.
    PerDocument {
        /// Finder instructions for the selector model
        finder: &'static str,
        /// Listing of every known document in the domain
        catalog: &'static str,
        /// Directory holding one file per document
        directory: &'static str,
        /// Substrings marking a selector response line as an identifier
        keywords: &'static [&'static str],
    },
    /// All policy text lives in one well-known document.
    Consolidated { document: &'static str },
}

impl PolicyDomain {
    /// Every supported domain, in display order.
    pub const ALL: [PolicyDomain; 2] = [PolicyDomain::Doad, PolicyDomain::Leave];

    /// Parse a domain from its exact wire name ("DOAD", "LEAVE").
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|domain| domain.as_str() == s)
    }

    /// Parse a domain name typed by a person: surrounding whitespace and
    /// case are ignored.
    pub fn parse_ignore_case(s: &str) -> Option<Self> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|domain| domain.as_str().eq_ignore_ascii_case(name))
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doad => "DOAD",
            Self::Leave => "LEAVE",
        }
    }

    /// Key of the answer-stage instruction template.
    pub fn instructions_key(&self) -> &'static str {
        match self {
            Self::Doad => "policy/doad/prompts/main.md",
            Self::Leave => "policy/leave/prompts/main.md",
        }
    }

    /// Retrieval layout for this domain.
    pub fn layout(&self) -> RetrievalLayout {
        match self {
            Self::Doad => RetrievalLayout::PerDocument {
                finder: "policy/doad/prompts/finder.md",
                catalog: "policy/doad/prompts/DOAD-list-table.md",
                directory: "doad",
                keywords: &["DOAD", "DAOD"],
            },
            Self::Leave => RetrievalLayout::Consolidated {
                document: "leave/consolidated_policies.md",
            },
        }
    }

    /// Whether queries in this domain run the selector stage.
    pub fn uses_selector(&self) -> bool {
        matches!(self.layout(), RetrievalLayout::PerDocument { .. })
    }

    /// Store key for one policy document, or `None` for consolidated domains.
    pub fn document_key(&self, identifier: &PolicyIdentifier) -> Option<String> {
        match self.layout() {
            RetrievalLayout::PerDocument { directory, .. } => Some(format!(
                "{}/{}.{}",
                directory,
                identifier.storage_name(),
                DOCUMENT_EXTENSION
            )),
            RetrievalLayout::Consolidated { .. } => None,
        }
    }

    /// Every fixed key this domain reads on each query.
    pub fn required_keys(&self) -> Vec<&'static str> {
        let mut keys = vec![self.instructions_key()];
        match self.layout() {
            RetrievalLayout::PerDocument {
                finder, catalog, ..
            } => {
                keys.push(finder);
                keys.push(catalog);
            }
            RetrievalLayout::Consolidated { document } => keys.push(document),
        }
        keys
    }
}

impl fmt::Display for PolicyDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(PolicyDomain::parse("DOAD"), Some(PolicyDomain::Doad));
        assert_eq!(PolicyDomain::parse("LEAVE"), Some(PolicyDomain::Leave));
        assert_eq!(PolicyDomain::parse("leave"), None);
        assert_eq!(PolicyDomain::parse(" DOAD"), None);
        assert_eq!(PolicyDomain::parse("QRO"), None);
        assert_eq!(PolicyDomain::parse(""), None);
    }

    #[test]
    fn test_parse_ignore_case() {
        assert_eq!(
            PolicyDomain::parse_ignore_case(" leave "),
            Some(PolicyDomain::Leave)
        );
        assert_eq!(PolicyDomain::parse_ignore_case("Doad"), Some(PolicyDomain::Doad));
        assert_eq!(PolicyDomain::parse_ignore_case("qro"), None);
    }

    #[test]
    fn test_document_key_replaces_spaces() {
        let id = PolicyIdentifier::new("DOAD 5019-4").unwrap();
        assert_eq!(
            PolicyDomain::Doad.document_key(&id).as_deref(),
            Some("doad/DOAD_5019-4.md")
        );
        assert_eq!(PolicyDomain::Leave.document_key(&id), None);
    }

    #[test]
    fn test_required_keys() {
        assert_eq!(
            PolicyDomain::Doad.required_keys(),
            vec![
                "policy/doad/prompts/main.md",
                "policy/doad/prompts/finder.md",
                "policy/doad/prompts/DOAD-list-table.md",
            ]
        );
        assert_eq!(
            PolicyDomain::Leave.required_keys(),
            vec!["policy/leave/prompts/main.md", "leave/consolidated_policies.md"]
        );
    }

    #[test]
    fn test_uses_selector() {
        assert!(PolicyDomain::Doad.uses_selector());
        assert!(!PolicyDomain::Leave.uses_selector());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&PolicyDomain::Leave).unwrap(),
            "\"LEAVE\""
        );
    }
}
