//! Generative collaborator.
//!
//! The engine asks a language model for two things: a one-sentence
//! reason/fix for a classified failure, and a replacement locator when the
//! deterministic healing tiers give up. Both call sites treat the model as
//! unreliable and keep a deterministic fallback, so everything here is
//! behind the small [`Generator`] seam:
//!
//! - **LlmClient**: OpenAI-compatible chat completions (feature `llm`)
//! - **DisabledGenerator**: always fails, forcing the fallbacks

#[cfg(feature = "llm")]
pub mod client;

#[cfg(feature = "llm")]
pub use client::{ChatMessage, ChatRequest, ChatResponse, ChatResponseChoice, LlmClient, Role};

use crate::config::LlmConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Errors from the generative collaborator.
#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    /// HTTP request failed.
    #[cfg(feature = "llm")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Server returned an error status.
    #[error("API error {status}: {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// The model replied with nothing usable.
    #[error("Empty reply from model")]
    EmptyReply,
    /// No endpoint is configured.
    #[error("Generative collaborator is disabled")]
    Disabled,
}

/// A request/response text generator with no availability guarantee.
#[async_trait]
pub trait Generator: Send + Sync + std::fmt::Debug {
    /// Complete `prompt` under the `system` instruction.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmClientError>;
}

/// Generator used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmClientError> {
        Err(LlmClientError::Disabled)
    }
}

/// Build the generator described by configuration.
#[must_use]
pub fn generator_from_config(config: Option<&LlmConfig>) -> Arc<dyn Generator> {
    match config {
        #[cfg(feature = "llm")]
        Some(llm) => Arc::new(LlmClient::from_config(llm)),
        #[cfg(not(feature = "llm"))]
        Some(_) => {
            tracing::warn!("llm endpoint configured but the `llm` feature is disabled");
            Arc::new(DisabledGenerator)
        }
        None => Arc::new(DisabledGenerator),
    }
}

/// Scripted generator for unit tests: replays queued replies and counts calls.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedGenerator {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<String, ()>>>,
    fallback: Option<String>,
    calls: std::sync::atomic::AtomicUsize,
    prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedGenerator {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            fallback: Some(reply.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, reply: Result<&str, ()>) {
        self.replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(reply.map(str::to_string));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Generator for ScriptedGenerator {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmClientError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(prompt.to_string());
        let queued = self
            .replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        match queued {
            Some(Ok(text)) => Ok(text),
            Some(Err(())) => Err(LlmClientError::EmptyReply),
            None => self.fallback.clone().ok_or(LlmClientError::Disabled),
        }
    }
}
