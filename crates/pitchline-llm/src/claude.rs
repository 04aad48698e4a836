//! Anthropic Claude provider adapter (messages API).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::{ModelConfig, ProviderKind};
use crate::error::{ProviderError, Result};
use crate::provider::{ModelProvider, TaskRequest};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default per-call deadline, shared by all three adapters. A timeout is
/// an ordinary provider failure and eligible for fallback.
pub(crate) const CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Adapter for the Anthropic messages API.
pub struct ClaudeProvider {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl ClaudeProvider {
    /// Create an adapter, resolving the API key from `ANTHROPIC_API_KEY`.
    /// Absence of the key means "not configured", not an error.
    pub fn from_env() -> Self {
        Self::with_api_key(std::env::var(ProviderKind::Claude.api_key_env()).ok())
    }

    /// Create an adapter with an explicit (possibly absent) API key.
    pub fn with_api_key(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            http: reqwest::Client::builder()
                .timeout(CALL_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Point the adapter at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ModelProvider for ClaudeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, task: &TaskRequest, config: &ModelConfig) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "set {} env var",
                ProviderKind::Claude.api_key_env()
            ))
        })?;

        debug!(provider = "claude", model = %config.model, "sending messages request");

        let mut body = serde_json::json!({
            "model": config.model,
            // The messages API requires max_tokens.
            "max_tokens": config.max_tokens.unwrap_or(4096),
            "temperature": config.temperature,
            "messages": [{"role": "user", "content": task.user_message()}],
        });
        if let Some(system) = &task.system_prompt {
            body["system"] = serde_json::Value::String(system.clone());
        }

        let response = self
            .http
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body, &config.model));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse response: {e}")))?;

        parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text)
            .ok_or_else(|| ProviderError::InvalidResponse("no text content block".into()))
    }
}
