//! Provider kinds, task types, and the task-to-model selection table.
//!
//! The supported providers are a fixed closed set. Each semantic task type
//! maps to a preferred provider, a specific model, and a temperature tuned
//! for that task; deterministic tasks get low temperature, creative
//! writing gets higher.

use serde::{Deserialize, Serialize};

/// The closed set of supported AI providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Anthropic Claude (messages API).
    Claude,
    /// Google Gemini (generateContent API).
    Gemini,
    /// OpenAI (chat completions API).
    OpenAi,
}

/// The fixed cross-provider fallback order, same for every task.
///
/// Deliberately an explicit list rather than enum declaration order, so
/// growing [`ProviderKind`] cannot silently change fallback behavior.
pub const FALLBACK_ORDER: [ProviderKind; 3] =
    [ProviderKind::Claude, ProviderKind::OpenAi, ProviderKind::Gemini];

impl ProviderKind {
    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "ANTHROPIC_API_KEY",
            ProviderKind::Gemini => "GOOGLE_GEMINI_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// The snake_case name used in logs and audit entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic task types the router selects models for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Math and structured extraction: deterministic, low temperature.
    Extraction,
    /// Compliance and analysis over documents.
    Analysis,
    /// Creative proposal copy.
    Writing,
    /// Anything else.
    General,
}

/// A resolved provider/model selection for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// The provider to dispatch to.
    pub provider: ProviderKind,

    /// The model name, in the provider's own naming scheme.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f64,

    /// Maximum tokens to generate, if bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// The static task-type lookup table.
///
/// This is the designed pairing of task to provider strength: extraction
/// goes to OpenAI at near-zero temperature, analysis and writing go to
/// Claude, and everything else goes to Gemini's fast model. When the
/// selected provider is not configured, the router's fallback walk takes
/// over.
pub fn select_model(task: TaskType) -> ModelConfig {
    match task {
        TaskType::Extraction => ModelConfig {
            provider: ProviderKind::OpenAi,
            model: "gpt-4o".into(),
            temperature: 0.1,
            max_tokens: Some(2048),
        },
        TaskType::Analysis => ModelConfig {
            provider: ProviderKind::Claude,
            model: "claude-sonnet-4-5-20250514".into(),
            temperature: 0.2,
            max_tokens: Some(4096),
        },
        TaskType::Writing => ModelConfig {
            provider: ProviderKind::Claude,
            model: "claude-sonnet-4-5-20250514".into(),
            temperature: 0.7,
            max_tokens: Some(4096),
        },
        TaskType::General => ModelConfig {
            provider: ProviderKind::Gemini,
            model: "gemini-2.5-flash".into(),
            temperature: 0.4,
            max_tokens: Some(2048),
        },
    }
}
