//! Execution metadata: audit entries and citations.
//!
//! Both are immutable once appended to a context. The audit trail records
//! one entry per plugin execution attempt (success or failure); citations
//! record the sources backing numeric or factual output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// An immutable record of one plugin execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the attempt finished.
    pub timestamp: DateTime<Utc>,

    /// The stage the plugin ran in.
    pub stage: Stage,

    /// Identifier of the plugin that ran (e.g. "field_validation").
    pub plugin_id: String,

    /// The model that served an AI call, if the plugin made one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Short description of what the plugin did.
    pub action: String,

    /// Wall-clock duration of the attempt in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Whether the attempt succeeded.
    pub success: bool,

    /// The error message for failed attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Free-form plugin-specific metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Record a successful attempt.
    pub fn success(
        stage: Stage,
        plugin_id: impl Into<String>,
        action: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            stage,
            plugin_id: plugin_id.into(),
            model: None,
            action: action.into(),
            duration_ms: Some(duration_ms),
            success: true,
            error: None,
            metadata: None,
        }
    }

    /// Record a failed attempt.
    pub fn failure(
        stage: Stage,
        plugin_id: impl Into<String>,
        action: impl Into<String>,
        duration_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            stage,
            plugin_id: plugin_id.into(),
            model: None,
            action: action.into(),
            duration_ms: Some(duration_ms),
            success: false,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Attach the model identifier that served an AI call.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attach free-form metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A sourced claim backing numeric or factual output in the proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Where the claim comes from (URL, table name, document).
    pub source: String,

    /// The claim being backed.
    pub claim: String,

    /// Confidence in the claim, 0.0 to 1.0.
    pub confidence: f64,
}

impl Citation {
    /// Create a citation, clamping confidence into `0.0..=1.0`.
    pub fn new(source: impl Into<String>, claim: impl Into<String>, confidence: f64) -> Self {
        Self {
            source: source.into(),
            claim: claim.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
