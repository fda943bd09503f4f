//! Pipeline error types.
//!
//! Validation problems are reported before any external call. Every other
//! failure names the stage it came from so callers can tell a missing
//! template apart from a failed model call.

use crate::store::StorageError;
use policyqa_core::AppError;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading the answer instructions
    Instructions,
    /// Reading the selector's finder template
    Finder,
    /// Reading the domain catalog
    Catalog,
    /// Selector (finder) model call
    Selector,
    /// Per-document reads
    Assembly,
    /// Consolidated document read
    Consolidated,
    /// Answer (main) model call
    Generator,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instructions => "instructions",
            Self::Finder => "finder",
            Self::Catalog => "catalog",
            Self::Selector => "selector",
            Self::Assembly => "assembly",
            Self::Consolidated => "consolidated",
            Self::Generator => "generator",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a query was rejected before running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid policy set: {0}")]
    InvalidDomain(String),

    #[error("messages cannot be empty")]
    EmptyConversation,

    #[error("invalid message role at index {index}: {role}")]
    InvalidRole { index: usize, role: String },

    #[error("message content cannot be empty (index {index})")]
    EmptyTurn { index: usize },

    #[error("message content too long at index {index}: {length} characters (max {max})")]
    TurnTooLong {
        index: usize,
        length: usize,
        max: usize,
    },

    #[error("total conversation length too long: {length} characters (max {max})")]
    ConversationTooLong { length: usize, max: usize },
}

/// Failure of a policy query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{stage} stage: failed to read {key}: {source}")]
    PromptUnavailable {
        stage: Stage,
        key: String,
        source: StorageError,
    },

    #[error("selector stage: no response from selector model")]
    NoSelectorResponse,

    #[error("generator stage: no response from answer model")]
    NoGeneratorResponse,

    #[error("{stage} stage: upstream call failed: {source}")]
    Upstream { stage: Stage, source: AppError },

    #[error("consolidated stage: policy document {key} unavailable: {source}")]
    ConsolidatedDocumentUnavailable { key: String, source: StorageError },

    #[error("{stage} stage: cancelled")]
    Cancelled { stage: Stage },
}

impl QueryError {
    /// Stage the failure came from; `None` for validation failures.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Validation(_) => None,
            Self::PromptUnavailable { stage, .. }
            | Self::Upstream { stage, .. }
            | Self::Cancelled { stage } => Some(*stage),
            Self::NoSelectorResponse => Some(Stage::Selector),
            Self::NoGeneratorResponse => Some(Stage::Generator),
            Self::ConsolidatedDocumentUnavailable { .. } => Some(Stage::Consolidated),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        if err.is_cancelled() {
            AppError::Cancelled(err.to_string())
        } else {
            AppError::Query(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = QueryError::from(ValidationError::TurnTooLong {
            index: 2,
            length: 4001,
            max: 4000,
        });
        assert!(err.is_validation());
        assert_eq!(err.stage(), None);
        assert_eq!(
            err.to_string(),
            "validation error: message content too long at index 2: 4001 characters (max 4000)"
        );
    }

    #[test]
    fn test_stage_tags() {
        let err = QueryError::Upstream {
            stage: Stage::Selector,
            source: AppError::Llm("timeout".to_string()),
        };
        assert_eq!(err.stage(), Some(Stage::Selector));
        assert!(err.to_string().starts_with("selector stage"));

        assert_eq!(
            QueryError::NoGeneratorResponse.stage(),
            Some(Stage::Generator)
        );
    }

    #[test]
    fn test_into_app_error() {
        let cancelled: AppError = QueryError::Cancelled {
            stage: Stage::Generator,
        }
        .into();
        assert!(matches!(cancelled, AppError::Cancelled(_)));

        let other: AppError = QueryError::NoSelectorResponse.into();
        assert!(matches!(other, AppError::Query(ref m) if m.contains("selector")));
    }
}
