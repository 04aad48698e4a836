//! The core [`ModelProvider`] trait and the task/response types.
//!
//! Every provider adapter receives an optional system prompt, a user
//! prompt, and optional free-text context to prepend; it returns raw text
//! content. The router wraps that text into a [`ModelResponse`] carrying
//! which provider/model actually served it and the call latency.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ProviderKind, TaskType};
use crate::error::Result;

/// A described task to run against some AI provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// The semantic task type, used for model selection.
    pub task_type: TaskType,

    /// Optional system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// The user prompt.
    pub prompt: String,

    /// Optional free-text context prepended to the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl TaskRequest {
    /// Create a task with just a type and prompt.
    pub fn new(task_type: TaskType, prompt: impl Into<String>) -> Self {
        Self {
            task_type,
            system_prompt: None,
            prompt: prompt.into(),
            context: None,
        }
    }

    /// Attach a system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Attach free-text context to prepend to the prompt.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The user-facing message: prompt with any context block prepended.
    pub fn user_message(&self) -> String {
        match &self.context {
            Some(ctx) if !ctx.is_empty() => format!("Context:\n{ctx}\n\n{}", self.prompt),
            _ => self.prompt.clone(),
        }
    }
}

/// The result of a routed model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated text.
    pub content: String,

    /// The provider that actually served the call (after any fallback).
    pub provider: ProviderKind,

    /// The model that actually served the call.
    pub model: String,

    /// Wall-clock latency of the successful call in milliseconds.
    pub latency_ms: u64,
}

/// A provider that can execute completion tasks.
///
/// Implementations handle the protocol details for one specific provider
/// API (authentication, request formatting, response parsing). Failures
/// are mapped to the uniform [`ProviderError`](crate::error::ProviderError)
/// taxonomy regardless of provider.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> ProviderKind;

    /// The model used when this provider serves a fallback attempt.
    fn default_model(&self) -> &str;

    /// Whether credentials are configured. An unconfigured provider is
    /// treated as unavailable, never as an error.
    fn is_configured(&self) -> bool;

    /// Execute the task and return the raw generated text.
    async fn complete(&self, task: &TaskRequest, config: &ModelConfig) -> Result<String>;
}
