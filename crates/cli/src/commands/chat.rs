//! Chat command handler.
//!
//! Interactive policy conversation. Each question is answered with the full
//! conversation so far; conversations are not saved.

use super::{log_usage, QueryCancellation};
use clap::Args;
use policyqa_core::{config::AppConfig, AppError, AppResult};
use policyqa_prompt::ConversationTurn;
use policyqa_retrieval::{PolicyDomain, QueryRouter, ValidationError};
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// Interactive policy conversation
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Policy set to answer from (DOAD, LEAVE)
    #[arg(short, long, default_value = "DOAD")]
    pub domain: String,

    /// Cancel each query after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Question(&'a str),
    Reset,
    Exit,
    Skip,
}

fn parse_input(line: &str) -> ChatInput<'_> {
    match line.trim() {
        "" => ChatInput::Skip,
        "/exit" | "/quit" => ChatInput::Exit,
        "/reset" => ChatInput::Reset,
        question => ChatInput::Question(question),
    }
}

/// Wait for the next input line. An interrupt ends input the same way
/// end-of-file does.
async fn next_line<R>(
    lines: &mut Lines<R>,
    interrupt: impl Future<Output = ()>,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        biased;
        _ = interrupt => Ok(None),
        line = lines.next_line() => line,
    }
}

/// Resolves on Ctrl-C. Once a query has registered a Ctrl-C listener the
/// default SIGINT exit no longer applies, so the prompt listens as well.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        config.validate()?;

        let domain = PolicyDomain::parse_ignore_case(&self.domain).ok_or_else(|| {
            AppError::Query(ValidationError::InvalidDomain(self.domain.clone()).to_string())
        })?;

        let router = QueryRouter::from_config(config)?;
        let mut conversation: Vec<ConversationTurn> = Vec::new();

        eprintln!(
            "PolicyQA chat ({}). /reset clears the conversation; /exit, Ctrl-C or Ctrl-D quits.",
            domain
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            eprint!("> ");
            std::io::stderr().flush().ok();

            let Some(line) = next_line(&mut lines, interrupted()).await? else {
                eprintln!();
                break;
            };

            let question = match parse_input(&line) {
                ChatInput::Skip => continue,
                ChatInput::Exit => break,
                ChatInput::Reset => {
                    conversation.clear();
                    eprintln!("Conversation cleared.");
                    continue;
                }
                ChatInput::Question(question) => question,
            };

            let cancellation = QueryCancellation::start(self.timeout);
            match router
                .respond(&mut conversation, question, domain, cancellation.token())
                .await
            {
                Ok(result) => {
                    println!("{}", result.answer());
                    if !result.citations().is_empty() {
                        println!("Cited: {}", result.citations().join(", "));
                    }
                    println!();
                    log_usage(&result);
                }
                Err(e) => {
                    // The turn was not recorded; the user can rephrase.
                    tracing::warn!("Query failed: {}", e);
                    eprintln!("Error: {}", e);
                }
            }
        }

        tracing::debug!("Chat ended after {} turns", conversation.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("   "), ChatInput::Skip);
        assert_eq!(parse_input("/exit"), ChatInput::Exit);
        assert_eq!(parse_input(" /quit "), ChatInput::Exit);
        assert_eq!(parse_input("/reset"), ChatInput::Reset);
        assert_eq!(
            parse_input("  How much leave?  "),
            ChatInput::Question("How much leave?")
        );
    }

    #[tokio::test]
    async fn test_next_line_reads_input() {
        let mut lines = BufReader::new(&b"How much leave?\n/exit\n"[..]).lines();

        let line = next_line(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(line.as_deref(), Some("How much leave?"));
        let line = next_line(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(line.as_deref(), Some("/exit"));
        assert_eq!(next_line(&mut lines, std::future::pending()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_line_stops_on_interrupt() {
        let mut lines = BufReader::new(&b"How much leave?\n"[..]).lines();

        let line = next_line(&mut lines, std::future::ready(())).await.unwrap();
        assert_eq!(line, None);
    }
}
