//! PolicyQA CLI
//!
//! Main entry point for the policyqa command-line tool.
//! Answers policy questions from a policy document store.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, CheckCommand, DomainsCommand};
use policyqa_core::{
    config::AppConfig,
    logging::{self, LogFormat},
    AppError, AppResult,
};
use std::path::PathBuf;

/// PolicyQA - answers policy questions from the policy text itself
#[derive(Parser, Debug)]
#[command(name = "policyqa")]
#[command(about = "Answers policy questions from the policy text itself", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "POLICYQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log line format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Completion provider (openrouter, openai, ollama, scripted)
    #[arg(short, long, global = true, env = "POLICYQA_PROVIDER")]
    provider: Option<String>,

    /// Model for the selector stage
    #[arg(long, global = true)]
    selector_model: Option<String>,

    /// Model for the answer stage
    #[arg(long, global = true)]
    answer_model: Option<String>,

    /// Policy document directory (fs store)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single policy question
    Ask(AskCommand),

    /// Interactive policy conversation
    Chat(ChatCommand),

    /// List supported policy sets
    Domains(DomainsCommand),

    /// Check configuration and document store layout
    Check(CheckCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let log_format = cli
        .log_format
        .as_deref()
        .map(|s| {
            LogFormat::parse(s)
                .ok_or_else(|| AppError::Config(format!("Unknown log format: {}", s)))
        })
        .transpose()?;

    // Load base configuration from file and environment
    let config = AppConfig::load_from(cli.config.as_deref())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.provider,
        cli.selector_model,
        cli.answer_model,
        cli.store,
        cli.log_level,
        log_format,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)?;

    tracing::info!("PolicyQA CLI starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!(
        "Models: selector={}, answer={}",
        config.selector_model,
        config.answer_model
    );

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Domains(_) => "domains",
        Commands::Check(_) => "check",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Domains(cmd) => cmd.execute(),
        Commands::Check(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
