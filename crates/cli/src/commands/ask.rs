//! Ask command handler.
//!
//! Answers one policy question, optionally continuing an earlier
//! conversation loaded from a JSON file.

use super::{log_usage, result_json, QueryCancellation};
use clap::Args;
use policyqa_core::{config::AppConfig, AppError, AppResult};
use policyqa_retrieval::{PolicyDomain, QueryRequest, QueryRouter, TurnInput};
use std::path::{Path, PathBuf};

/// Ask a single policy question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Policy set to answer from (DOAD, LEAVE)
    #[arg(short, long, default_value = "DOAD")]
    pub domain: String,

    /// JSON file with earlier turns: [{"role": "user", "content": "..."}]
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Cancel the query after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        config.validate()?;

        let mut messages = match self.history {
            Some(ref path) => load_history(path)?,
            None => Vec::new(),
        };
        messages.push(TurnInput::new("user", self.question.clone()));

        // Accept `--domain leave`; unknown names still fail validation.
        let policy_set = match PolicyDomain::parse_ignore_case(&self.domain) {
            Some(domain) => domain.as_str().to_string(),
            None => self.domain.clone(),
        };
        let request = QueryRequest {
            messages,
            policy_set,
        };

        let router = QueryRouter::from_config(config)?;
        let cancellation = QueryCancellation::start(self.timeout);

        let result = router.process(&request, cancellation.token()).await?;

        if self.json {
            let output = result_json(&result, &config.provider);
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", result.answer());
            if !result.citations().is_empty() {
                println!();
                println!("Cited: {}", result.citations().join(", "));
            }
            log_usage(&result);
        }

        Ok(())
    }
}

/// Read earlier conversation turns from a JSON array.
fn load_history(path: &Path) -> AppResult<Vec<TurnInput>> {
    let content = std::fs::read_to_string(path)?;
    let turns: Vec<TurnInput> = serde_json::from_str(&content)?;
    tracing::debug!("Loaded {} history turns from {:?}", turns.len(), path);
    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_history() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[{{"role": "user", "content": "Hi"}}, {{"role": "assistant", "content": "Hello", "timestamp": 1760000000000}}]"#
        )
        .unwrap();

        let turns = load_history(file.path()).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, "assistant");
        assert_eq!(turns[1].timestamp, Some(1760000000000));
    }

    #[test]
    fn test_load_history_rejects_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(matches!(
            load_history(file.path()),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn test_missing_history_file() {
        assert!(matches!(
            load_history(Path::new("/nonexistent/history.json")),
            Err(AppError::Io(_))
        ));
    }
}
