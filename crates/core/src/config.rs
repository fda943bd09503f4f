//! Configuration management for PolicyQA.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (`policyqa.yaml`, or the path in `POLICYQA_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win over earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "policyqa.yaml";

/// Environment variable consulted for the API key when the config file does
/// not name one.
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

const KNOWN_PROVIDERS: [&str; 4] = ["openrouter", "openai", "ollama", "scripted"];

/// Main application configuration.
///
/// Everything the query pipeline needs at construction time: completion
/// provider settings, the two stage models, and where policy documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Completion provider ("openrouter", "openai", "ollama", "scripted")
    pub provider: String,

    /// Optional custom base URL for the provider
    pub endpoint: Option<String>,

    /// API key for the provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Model used by the selector (finder) stage
    pub selector_model: String,

    /// Model used by the answer (main) stage
    pub answer_model: String,

    /// Sampling temperature for both stages
    pub temperature: f32,

    /// Completion token limit per call
    pub max_tokens: u32,

    /// Per-request timeout for the completion service
    pub request_timeout_secs: u64,

    /// Attribution title sent to the provider
    pub app_title: Option<String>,

    /// Attribution referer sent to the provider
    pub app_referer: Option<String>,

    /// Optional cap on identifiers returned by the selector stage
    pub max_policies: Option<usize>,

    /// Document store settings
    pub storage: StorageConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Local directory tree
    #[default]
    Fs,
    /// Object store reachable over HTTP
    Http,
}

/// Document store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the `fs` backend
    pub root: Option<PathBuf>,

    /// Base URL for the `http` backend
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,

    /// Environment variable holding a bearer token for the `http` backend
    #[serde(rename = "tokenEnv")]
    pub token_env: Option<String>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    retrieval: Option<RetrievalSection>,
    storage: Option<StorageConfig>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    #[serde(rename = "selectorModel")]
    selector_model: Option<String>,
    #[serde(rename = "answerModel")]
    answer_model: Option<String>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
    #[serde(rename = "appTitle")]
    app_title: Option<String>,
    #[serde(rename = "appReferer")]
    app_referer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RetrievalSection {
    #[serde(rename = "maxPolicies")]
    max_policies: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "openrouter".to_string(),
            endpoint: None,
            api_key: None,
            selector_model: "anthropic/claude-3-haiku".to_string(),
            answer_model: "anthropic/claude-3.5-sonnet".to_string(),
            temperature: 0.1,
            max_tokens: 4000,
            request_timeout_secs: 60,
            app_title: Some("PolicyQA".to_string()),
            app_referer: None,
            max_policies: None,
            storage: StorageConfig::default(),
            log_level: None,
            log_format: LogFormat::Text,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file and environment.
    ///
    /// Environment variables:
    /// - `POLICYQA_CONFIG`: Path to config file
    /// - `POLICYQA_PROVIDER`: Completion provider
    /// - `POLICYQA_ENDPOINT`: Provider base URL
    /// - `POLICYQA_API_KEY`: API key (falls back to the file's `apiKeyEnv`,
    ///   then `OPENROUTER_API_KEY`)
    /// - `POLICYQA_SELECTOR_MODEL` / `POLICYQA_ANSWER_MODEL`: Stage models
    /// - `POLICYQA_STORE`: Document store directory (fs backend)
    /// - `POLICYQA_STORE_URL`: Document store base URL (http backend)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use policyqa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Answer model: {}", config.answer_model);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None)
    }

    /// Load configuration, merging `config_file` instead of the default
    /// lookup when given.
    pub fn load_from(config_file: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        let config_path = match config_file {
            Some(path) => Some(path.to_path_buf()),
            None => match std::env::var("POLICYQA_CONFIG") {
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => {
                    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                    local.exists().then_some(local)
                }
            },
        };

        let mut api_key_env = DEFAULT_API_KEY_ENV.to_string();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
            let (merged, key_env) = config.merge_yaml(&path)?;
            config = merged;
            if let Some(key_env) = key_env {
                api_key_env = key_env;
            }
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("POLICYQA_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(endpoint) = std::env::var("POLICYQA_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Ok(model) = std::env::var("POLICYQA_SELECTOR_MODEL") {
            config.selector_model = model;
        }

        if let Ok(model) = std::env::var("POLICYQA_ANSWER_MODEL") {
            config.answer_model = model;
        }

        if let Ok(root) = std::env::var("POLICYQA_STORE") {
            config.storage.backend = StorageBackend::Fs;
            config.storage.root = Some(PathBuf::from(root));
        }

        if let Ok(url) = std::env::var("POLICYQA_STORE_URL") {
            config.storage.backend = StorageBackend::Http;
            config.storage.base_url = Some(url);
        }

        config.api_key = std::env::var("POLICYQA_API_KEY")
            .or_else(|_| std::env::var(&api_key_env))
            .ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    ///
    /// Returns the merged config and the API key variable named by the file.
    fn merge_yaml(&self, path: &Path) -> AppResult<(Self, Option<String>)> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());
        let mut api_key_env = None;

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
            if let Some(model) = llm.selector_model {
                result.selector_model = model;
            }
            if let Some(model) = llm.answer_model {
                result.answer_model = model;
            }
            if let Some(temperature) = llm.temperature {
                result.temperature = temperature;
            }
            if let Some(max_tokens) = llm.max_tokens {
                result.max_tokens = max_tokens;
            }
            if let Some(timeout) = llm.timeout_secs {
                result.request_timeout_secs = timeout;
            }
            if llm.app_title.is_some() {
                result.app_title = llm.app_title;
            }
            if llm.app_referer.is_some() {
                result.app_referer = llm.app_referer;
            }
            api_key_env = llm.api_key_env;
        }

        if let Some(retrieval) = config_file.retrieval {
            if retrieval.max_policies.is_some() {
                result.max_policies = retrieval.max_policies;
            }
        }

        if let Some(storage) = config_file.storage {
            result.storage = storage;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        Ok((result, api_key_env))
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        selector_model: Option<String>,
        answer_model: Option<String>,
        store: Option<PathBuf>,
        log_level: Option<String>,
        log_format: Option<LogFormat>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = selector_model {
            self.selector_model = model;
        }

        if let Some(model) = answer_model {
            self.answer_model = model;
        }

        if let Some(root) = store {
            self.storage.backend = StorageBackend::Fs;
            self.storage.root = Some(root);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if let Some(format) = log_format {
            self.log_format = format;
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Whether the provider talks to a remote service that needs a key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self.provider.as_str(), "openrouter" | "openai")
    }

    /// Resolve the bearer token for the http document store, if configured.
    pub fn storage_token(&self) -> Option<String> {
        self.storage
            .token_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }

    /// Validate configuration for the active provider and document store.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.requires_api_key() && self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(AppError::Config(format!(
                "API key required for provider '{}'. Set POLICYQA_API_KEY or {}",
                self.provider, DEFAULT_API_KEY_ENV
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.selector_model.trim().is_empty() || self.answer_model.trim().is_empty() {
            return Err(AppError::Config(
                "Selector and answer models must be set".to_string(),
            ));
        }

        match self.storage.backend {
            StorageBackend::Fs => match self.storage.root {
                Some(ref root) if root.is_dir() => {}
                Some(ref root) => {
                    return Err(AppError::Config(format!(
                        "Document store directory does not exist: {:?}",
                        root
                    )))
                }
                None => {
                    return Err(AppError::Config(
                        "Document store directory not set (storage.root or POLICYQA_STORE)"
                            .to_string(),
                    ))
                }
            },
            StorageBackend::Http => {
                if self.storage.base_url.is_none() {
                    return Err(AppError::Config(
                        "Document store URL not set (storage.baseUrl or POLICYQA_STORE_URL)"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check if all required configuration is present.
    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }
}
