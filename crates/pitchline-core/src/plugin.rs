//! The [`ProposalPlugin`] trait and its descriptor.
//!
//! A plugin is a named, versioned, stage-tagged, priority-ordered unit of
//! work over a [`ProposalContext`]. Plugins prefer recording warnings and
//! errors into the context over returning `Err`; a returned error means
//! the attempt as a whole failed and is recorded as a failed audit entry
//! by the manager, without stopping sibling plugins in the same stage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pitchline_llm::ProviderError;
use pitchline_types::{ProposalContext, Stage};

/// Process-wide metadata about one plugin. Owned by the registry, read by
/// every pipeline execution, never mutated by one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Stable identifier (e.g. "field_validation").
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Semantic version of the plugin implementation.
    pub version: String,

    /// The single stage this plugin belongs to.
    pub stage: Stage,

    /// Execution priority within the stage: lower runs first, ties broken
    /// by registration order.
    pub priority: i32,
}

impl PluginDescriptor {
    /// Create a descriptor.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        stage: Stage,
        priority: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            stage,
            priority,
        }
    }
}

/// Errors produced by plugin execution.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Required-field validation failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Plugin execution failed at runtime.
    #[error("plugin execution failed: {0}")]
    ExecutionFailed(String),

    /// A model-router call failed (after exhausting all fallbacks).
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// An external fetch failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single unit of work in the proposal pipeline.
///
/// Implementations must be `Send + Sync`: the registry shares them across
/// pipeline executions, though any one context is only ever mutated by one
/// plugin at a time.
#[async_trait]
pub trait ProposalPlugin: Send + Sync {
    /// This plugin's process-wide metadata.
    fn descriptor(&self) -> PluginDescriptor;

    /// Run against the context, mutating it in place.
    async fn run(&self, ctx: &mut ProposalContext) -> Result<(), PluginError>;
}
