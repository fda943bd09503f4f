//! Query routing.
//!
//! [`QueryRouter`] is the entry point of the pipeline: it validates a query,
//! reads the domain's answer instructions, fetches policy text with the
//! domain's retrieval strategy and asks the answer model for a reply.
//! Stages run strictly in order. The router holds no per-query state, so
//! one instance can serve concurrent queries.

use crate::assembler::PolicyContentAssembler;
use crate::cancel::read_required;
use crate::citations::extract_citations;
use crate::domain::{PolicyDomain, RetrievalLayout};
use crate::error::{QueryError, Stage};
use crate::generator::AnswerGenerator;
use crate::parser::{KeywordLineParser, ResponseParser};
use crate::selector::PolicySelector;
use crate::store::{create_store, DocumentStore};
use crate::strategy::RetrievalStrategy;
use crate::types::{QueryRequest, QueryResult, StageUsage};
use crate::validation::{validate_conversation, validate_request};
use policyqa_core::{AppConfig, AppError, AppResult};
use policyqa_llm::{create_client, ClientOptions, CompletionClient};
use policyqa_prompt::ConversationTurn;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Immutable per-router settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterSettings {
    /// Model for the selector stage
    pub selector_model: String,

    /// Model for the answer stage
    pub answer_model: String,

    /// Sampling temperature for both stages
    pub temperature: f32,

    /// Completion token limit per call
    pub max_tokens: Option<u32>,

    /// Cap on selected identifiers
    pub max_policies: Option<usize>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RouterSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            selector_model: config.selector_model.clone(),
            answer_model: config.answer_model.clone(),
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
            max_policies: config.max_policies,
        }
    }
}

/// Validates queries and runs them through the two-stage pipeline.
#[derive(Clone)]
pub struct QueryRouter {
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn DocumentStore>,
    settings: RouterSettings,
    parser: Option<Arc<dyn ResponseParser>>,
}

impl QueryRouter {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn DocumentStore>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            client,
            store,
            settings,
            parser: None,
        }
    }

    /// Build a router from configuration: completion client, document store
    /// and stage settings.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let options = ClientOptions {
            timeout: Duration::from_secs(config.request_timeout_secs),
            app_title: config.app_title.clone(),
            app_referer: config.app_referer.clone(),
        };
        let client = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
            &options,
        )
        .map_err(|e| AppError::Config(format!("Failed to create completion client: {}", e)))?;
        let store = create_store(config)?;

        tracing::debug!(
            provider = client.provider_name(),
            store = store.backend_name(),
            "Query router ready"
        );

        Ok(Self::new(client, store, RouterSettings::from(config)))
    }

    /// Replace the keyword parser used on selector responses.
    pub fn with_response_parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Wire names of every supported domain.
    pub fn supported_domains() -> Vec<&'static str> {
        PolicyDomain::ALL.iter().map(PolicyDomain::as_str).collect()
    }

    /// Validate and answer a raw request.
    pub async fn process(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, QueryError> {
        let (domain, conversation) = validate_request(request)?;
        self.run(domain, &conversation, cancel).await
    }

    /// Validate and answer a conversation that is already typed.
    pub async fn process_conversation(
        &self,
        conversation: &[ConversationTurn],
        domain: PolicyDomain,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, QueryError> {
        validate_conversation(conversation)?;
        self.run(domain, conversation, cancel).await
    }

    /// Answer a follow-up question in an ongoing conversation.
    ///
    /// The question is appended as a user turn and, on success, the answer as
    /// an assistant turn. On failure the conversation is left as it was.
    pub async fn respond(
        &self,
        conversation: &mut Vec<ConversationTurn>,
        question: impl Into<String>,
        domain: PolicyDomain,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, QueryError> {
        conversation.push(ConversationTurn::user(question));

        match self.process_conversation(conversation, domain, cancel).await {
            Ok(result) => {
                conversation.push(ConversationTurn::assistant(result.answer()));
                Ok(result)
            }
            Err(e) => {
                conversation.pop();
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        domain: PolicyDomain,
        conversation: &[ConversationTurn],
        cancel: &CancellationToken,
    ) -> Result<QueryResult, QueryError> {
        let query_id = Uuid::new_v4();
        let span = tracing::info_span!("policy_query", query_id = %query_id, domain = %domain);

        async move {
            let start = Instant::now();
            tracing::info!(turns = conversation.len(), "Processing policy query");

            let result = self.execute(domain, conversation, cancel).await;

            match result {
                Ok(ref answer) => tracing::info!(
                    documents = answer.sources().len(),
                    tokens = answer.total_usage().total_tokens,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Policy query complete"
                ),
                Err(ref e) => tracing::warn!(
                    stage = e.stage().map(|s| s.as_str()).unwrap_or("validation"),
                    error = %e,
                    "Policy query failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        domain: PolicyDomain,
        conversation: &[ConversationTurn],
        cancel: &CancellationToken,
    ) -> Result<QueryResult, QueryError> {
        let instructions = self.instructions(domain, cancel).await?;

        let selector = self.selector_for(domain);
        let assembler = PolicyContentAssembler::new(self.store.clone());
        let strategy =
            RetrievalStrategy::for_domain(domain, self.store.as_ref(), &selector, &assembler);
        tracing::debug!(strategy = strategy.name(), "Fetching policy content");

        let context = strategy.fetch_context(conversation, cancel).await?;

        let (answer, generator_usage) = self
            .generator()
            .generate(conversation, &instructions, &context.documents, cancel)
            .await?;

        let citations = extract_citations(domain, &answer);
        let sources = context.documents.iter().map(|d| d.key.clone()).collect();

        Ok(QueryResult::new(
            answer,
            domain,
            StageUsage {
                selector: context.selector_usage,
                generator: generator_usage,
            },
            citations,
            sources,
        ))
    }

    /// Read the domain's answer instructions. They are used as stored.
    async fn instructions(
        &self,
        domain: PolicyDomain,
        cancel: &CancellationToken,
    ) -> Result<String, QueryError> {
        read_required(
            self.store.as_ref(),
            domain.instructions_key(),
            Stage::Instructions,
            cancel,
        )
        .await
    }

    fn selector_for(&self, domain: PolicyDomain) -> PolicySelector {
        let parser: Arc<dyn ResponseParser> = match self.parser {
            Some(ref parser) => parser.clone(),
            None => {
                let keywords: &[&str] = match domain.layout() {
                    RetrievalLayout::PerDocument { keywords, .. } => keywords,
                    RetrievalLayout::Consolidated { .. } => &[],
                };
                Arc::new(KeywordLineParser::new(keywords.iter().copied()))
            }
        };

        let mut selector =
            PolicySelector::new(self.client.clone(), &self.settings.selector_model, parser)
                .with_temperature(self.settings.temperature)
                .with_max_policies(self.settings.max_policies);
        if let Some(max_tokens) = self.settings.max_tokens {
            selector = selector.with_max_tokens(max_tokens);
        }
        selector
    }

    fn generator(&self) -> AnswerGenerator {
        let mut generator = AnswerGenerator::new(self.client.clone(), &self.settings.answer_model)
            .with_temperature(self.settings.temperature);
        if let Some(max_tokens) = self.settings.max_tokens {
            generator = generator.with_max_tokens(max_tokens);
        }
        generator
    }
}
