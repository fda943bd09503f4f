//! Extraction of policy identifiers from selector output.
//!
//! The selector model answers in free text. Parsing is deliberately
//! permissive: a line that mentions a domain keyword is taken as-is, with
//! no attempt to fix duplicates or malformed names. Unreadable identifiers
//! simply miss at assembly time.

use crate::types::PolicyIdentifier;

/// Turns a selector response into an ordered list of identifiers.
pub trait ResponseParser: Send + Sync + std::fmt::Debug {
    /// Parse identifiers in order of appearance.
    fn parse(&self, response: &str) -> Vec<PolicyIdentifier>;
}

/// Keeps every trimmed line containing one of the keywords.
#[derive(Debug, Clone)]
pub struct KeywordLineParser {
    keywords: Vec<String>,
}

impl KeywordLineParser {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

impl ResponseParser for KeywordLineParser {
    fn parse(&self, response: &str) -> Vec<PolicyIdentifier> {
        response
            .lines()
            .map(str::trim)
            .filter(|line| self.keywords.iter().any(|k| line.contains(k.as_str())))
            .filter_map(PolicyIdentifier::new)
            .collect()
    }
}
