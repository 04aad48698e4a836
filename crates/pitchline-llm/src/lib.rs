//! Multi-provider model routing for pitchline.
//!
//! This crate abstracts over the three supported AI providers (Claude,
//! Gemini, OpenAI), selects a provider and model per task type, and falls
//! back across providers when the chosen one is unavailable or errors.
//! It depends on nothing else in the pitchline workspace.
//!
//! # Architecture
//!
//! - [`ModelProvider`] trait defines the completion interface
//! - [`ClaudeProvider`], [`GeminiProvider`], [`OpenAiProvider`] implement
//!   it over each provider's HTTP API
//! - [`select_model`] maps semantic task types to a tuned provider/model
//! - [`ModelRouter`] dispatches a task and walks the fixed fallback order
//!   on failure
//!
//! # Quick start
//!
//! ```rust,ignore
//! use pitchline_llm::{ModelRouter, TaskRequest, TaskType};
//!
//! let router = ModelRouter::from_env();
//! let task = TaskRequest::new(TaskType::Extraction, "Extract the business name.")
//!     .with_context(page_text);
//! let response = router.route(&task, None).await?;
//! println!("{} served by {}", response.content, response.provider);
//! ```

pub mod claude;
pub mod config;
pub mod error;
pub mod gemini;
pub mod openai;
pub mod provider;
pub mod router;

pub use claude::ClaudeProvider;
pub use config::{select_model, ModelConfig, ProviderKind, TaskType, FALLBACK_ORDER};
pub use error::{ProviderError, Result};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use provider::{ModelProvider, ModelResponse, TaskRequest};
pub use router::ModelRouter;
