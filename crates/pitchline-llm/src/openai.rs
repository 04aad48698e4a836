//! OpenAI provider adapter (chat completions API).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::claude::CALL_TIMEOUT;
use crate::config::{ModelConfig, ProviderKind};
use crate::error::{ProviderError, Result};
use crate::provider::{ModelProvider, TaskRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";

/// Adapter for the OpenAI chat completions API.
pub struct OpenAiProvider {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiProvider {
    /// Create an adapter, resolving the API key from `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        Self::with_api_key(std::env::var(ProviderKind::OpenAi.api_key_env()).ok())
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

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
                ProviderKind::OpenAi.api_key_env()
            ))
        })?;

        debug!(provider = "openai", model = %config.model, "sending chat completion request");

        let mut messages = Vec::new();
        if let Some(system) = &task.system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": task.user_message()}));

        let mut body = serde_json::json!({
            "model": config.model,
            "temperature": config.temperature,
            "messages": messages,
        });
        if let Some(max_tokens) = config.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }

        let response = self
            .http
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body, &config.model));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("empty choices array".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_flag() {
        assert!(!OpenAiProvider::with_api_key(None).is_configured());
        assert!(OpenAiProvider::with_api_key(Some("sk-x".into())).is_configured());
    }

    #[test]
    fn completions_url() {
        let provider = OpenAiProvider::with_api_key(None).with_base_url("http://localhost:9");
        assert_eq!(provider.completions_url(), "http://localhost:9/v1/chat/completions");
    }
}
