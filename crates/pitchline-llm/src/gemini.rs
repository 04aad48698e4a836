//! Google Gemini provider adapter (generateContent API).
//!
//! Gemini authenticates with the API key as a query parameter and takes
//! the system prompt as a separate `systemInstruction` field.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::claude::CALL_TIMEOUT;
use crate::config::{ModelConfig, ProviderKind};
use crate::error::{ProviderError, Result};
use crate::provider::{ModelProvider, TaskRequest};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Adapter for the Gemini generateContent API.
pub struct GeminiProvider {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiProvider {
    /// Create an adapter, resolving the API key from `GOOGLE_GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        Self::with_api_key(std::env::var(ProviderKind::Gemini.api_key_env()).ok())
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

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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
                ProviderKind::Gemini.api_key_env()
            ))
        })?;

        debug!(provider = "gemini", model = %config.model, "sending generateContent request");

        let mut generation_config = serde_json::json!({"temperature": config.temperature});
        if let Some(max_tokens) = config.max_tokens {
            generation_config["maxOutputTokens"] = max_tokens.into();
        }

        let mut body = serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": task.user_message()}]}],
            "generationConfig": generation_config,
        });
        if let Some(system) = &task.system_prompt {
            body["systemInstruction"] = serde_json::json!({"parts": [{"text": system}]});
        }

        let response = self
            .http
            .post(self.generate_url(&config.model))
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body, &config.model));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse response: {e}")))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::InvalidResponse("no candidates returned".into()));
        }
        Ok(text)
    }
}
