//! Scripted completion provider.
//!
//! Replies from a queue of canned responses instead of calling a model.
//! Used by the pipeline tests as a counting fake and by the `scripted`
//! provider for offline runs, where it echoes the user prompt back.

use crate::client::{
    CompletionChoice, CompletionClient, CompletionRequest, CompletionResponse, UsageMetrics,
};
use policyqa_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One canned reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    /// A single choice with this text
    Text(String),
    /// A response with zero choices
    NoChoices,
    /// A transport-style failure
    Error(String),
    /// A single choice repeating the request's user prompt
    Echo,
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Deterministic completion client with call accounting.
///
/// Replies are consumed in order; once the queue is empty the last reply
/// repeats. Reported usage is fixed when set with [`ScriptedClient::with_usage`],
/// otherwise estimated at four characters per token.
#[derive(Debug)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
    last: Mutex<ScriptedReply>,
    usage: Option<UsageMetrics>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    /// Create a client that replies with `replies` in order.
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        let last = replies.last().cloned().unwrap_or(ScriptedReply::Echo);
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(last),
            usage: None,
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a client that always echoes the user prompt.
    pub fn echo() -> Self {
        Self::new(vec![ScriptedReply::Echo])
    }

    /// Create a client that always answers with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![ScriptedReply::Text(text.into())])
    }

    /// Report this usage on every successful reply.
    pub fn with_usage(mut self, usage: UsageMetrics) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Wait this long before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls made so far, including ones still waiting.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn next_reply(&self) -> ScriptedReply {
        let mut replies = self
            .replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match replies.pop_front() {
            Some(reply) => {
                *last = reply.clone();
                reply
            }
            None => last.clone(),
        }
    }

    fn usage_for(&self, request: &CompletionRequest, text: &str) -> UsageMetrics {
        if let Some(usage) = self.usage {
            return usage;
        }
        let prompt_chars = request.system.as_deref().map_or(0, str::len) + request.user.len();
        UsageMetrics::new(estimate_tokens(prompt_chars), estimate_tokens(text.len()))
    }
}

fn estimate_tokens(chars: usize) -> u32 {
    u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
}

#[async_trait::async_trait]
impl CompletionClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let text = match self.next_reply() {
            ScriptedReply::Text(text) => text,
            ScriptedReply::Echo => request.user.clone(),
            ScriptedReply::NoChoices => {
                return Ok(CompletionResponse {
                    choices: Vec::new(),
                    usage: self.usage.unwrap_or_default(),
                    model: request.model.clone(),
                })
            }
            ScriptedReply::Error(message) => return Err(AppError::Llm(message)),
        };

        tracing::debug!(model = %request.model, "Scripted completion");

        Ok(CompletionResponse {
            usage: self.usage_for(request, &text),
            choices: vec![CompletionChoice::new(text)],
            model: request.model.clone(),
        })
    }
}
