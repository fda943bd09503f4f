//! Pipeline type definitions.

use crate::domain::PolicyDomain;
use chrono::{DateTime, Utc};
use policyqa_llm::UsageMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque name of one retrievable document within a domain.
///
/// The only invariant is that it is not blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyIdentifier(String);

impl PolicyIdentifier {
    /// Create an identifier, rejecting blank input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name stem used in the document store (spaces become underscores).
    pub fn storage_name(&self) -> String {
        self.0.replace(' ', "_")
    }
}

impl fmt::Display for PolicyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Policy text read from the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Selector identifier, absent for consolidated documents
    pub identifier: Option<PolicyIdentifier>,

    /// Store key the text was read from
    pub key: String,

    /// Document text
    pub text: String,
}

/// Output of a retrieval strategy.
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    /// Documents in the order they should appear in the answer prompt
    pub documents: Vec<RetrievedDocument>,

    /// Usage of the selector call, when the strategy made one
    pub selector_usage: Option<UsageMetrics>,
}

/// One conversation turn as received from a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnInput {
    pub role: String,

    pub content: String,

    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl TurnInput {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: None,
        }
    }
}

/// A policy question as received from a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub messages: Vec<TurnInput>,

    #[serde(rename = "policy_set")]
    pub policy_set: String,
}

/// Per-stage token usage. The stages are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageUsage {
    #[serde(rename = "finder", skip_serializing_if = "Option::is_none")]
    pub selector: Option<UsageMetrics>,

    #[serde(rename = "main")]
    pub generator: UsageMetrics,
}

/// Answer to one policy query. Built once and never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    #[serde(rename = "message")]
    answer: String,
    timestamp: DateTime<Utc>,
    domain: PolicyDomain,
    usage: StageUsage,
    citations: Vec<String>,
    sources: Vec<String>,
}

impl QueryResult {
    pub(crate) fn new(
        answer: String,
        domain: PolicyDomain,
        usage: StageUsage,
        citations: Vec<String>,
        sources: Vec<String>,
    ) -> Self {
        Self {
            answer,
            timestamp: Utc::now(),
            domain,
            usage,
            citations,
            sources,
        }
    }

    /// The generated answer.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// When the result was produced.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn domain(&self) -> PolicyDomain {
        self.domain
    }

    /// Selector usage; `None` when the domain has no selector stage.
    pub fn selector_usage(&self) -> Option<UsageMetrics> {
        self.usage.selector
    }

    /// Answer-stage usage; always present.
    pub fn generator_usage(&self) -> UsageMetrics {
        self.usage.generator
    }

    /// Both stages summed, for display only.
    pub fn total_usage(&self) -> UsageMetrics {
        self.usage.selector.unwrap_or_default() + self.usage.generator
    }

    /// Policy references found in the answer, first occurrence first.
    pub fn citations(&self) -> &[String] {
        &self.citations
    }

    /// Store keys of the documents the answer was generated from.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rejects_blank() {
        assert!(PolicyIdentifier::new("").is_none());
        assert!(PolicyIdentifier::new("   ").is_none());
        let id = PolicyIdentifier::new("DOAD 1000-0 Legal Framework").unwrap();
        assert_eq!(id.storage_name(), "DOAD_1000-0_Legal_Framework");
        assert_eq!(id.to_string(), "DOAD 1000-0 Legal Framework");
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{
            "messages": [
                {"role": "user", "content": "How do I request leave?", "timestamp": 1760000000000}
            ],
            "policy_set": "LEAVE"
        }"#;
        let request: QueryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.policy_set, "LEAVE");
        assert_eq!(request.messages[0].timestamp, Some(1760000000000));
    }

    #[test]
    fn test_result_serialization_shape() {
        let result = QueryResult::new(
            "Submit Form X.".to_string(),
            PolicyDomain::Leave,
            StageUsage {
                selector: None,
                generator: UsageMetrics::new(100, 10),
            },
            Vec::new(),
            vec!["leave/consolidated_policies.md".to_string()],
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["message"], "Submit Form X.");
        assert_eq!(json["domain"], "LEAVE");
        assert!(json["usage"].get("finder").is_none());
        assert_eq!(json["usage"]["main"]["total_tokens"], 110);
        assert_eq!(result.total_usage(), UsageMetrics::new(100, 10));
    }
}
