//! Task routing with cross-provider fallback.
//!
//! [`ModelRouter`] resolves a [`ModelConfig`] for a task (explicit
//! override beats the task-type table), dispatches to the chosen
//! provider, and on any failure walks the fixed [`FALLBACK_ORDER`],
//! skipping the provider that just failed and any provider without
//! credentials. Each remaining provider is attempted exactly once; the
//! first success wins. Only when every remaining provider fails or is
//! unconfigured does the router surface an error.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::claude::ClaudeProvider;
use crate::config::{select_model, ModelConfig, ProviderKind, FALLBACK_ORDER};
use crate::error::{ProviderError, Result};
use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{ModelProvider, ModelResponse, TaskRequest};

/// Routes tasks to one of the configured providers, with fallback.
pub struct ModelRouter {
    providers: Vec<Box<dyn ModelProvider>>,
}

impl ModelRouter {
    /// Create a router over an explicit provider set. Tests inject stub
    /// providers here; production wiring uses [`ModelRouter::from_env`].
    pub fn new(providers: Vec<Box<dyn ModelProvider>>) -> Self {
        Self { providers }
    }

    /// Create a router over the three real adapters, with credentials
    /// resolved from their environment variables. Providers without
    /// credentials are present but unavailable.
    pub fn from_env() -> Self {
        Self::new(vec![
            Box::new(ClaudeProvider::from_env()),
            Box::new(GeminiProvider::from_env()),
            Box::new(OpenAiProvider::from_env()),
        ])
    }

    /// The subset of the fixed provider set that currently has
    /// credentials configured, in fallback order. Callers use this to
    /// short-circuit before attempting routing.
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        FALLBACK_ORDER
            .into_iter()
            .filter(|kind| {
                self.provider(*kind)
                    .map(|p| p.is_configured())
                    .unwrap_or(false)
            })
            .collect()
    }

    fn provider(&self, kind: ProviderKind) -> Option<&dyn ModelProvider> {
        self.providers
            .iter()
            .find(|p| p.kind() == kind)
            .map(|p| p.as_ref())
    }

    /// Resolve configuration and execute the task.
    ///
    /// An explicit `preferred` provider takes precedence over the
    /// task-type table; the task's tuned temperature is kept either way.
    ///
    /// # Errors
    ///
    /// [`ProviderError::AllProvidersExhausted`] when the chosen provider
    /// and every configured fallback failed.
    pub async fn route(
        &self,
        task: &TaskRequest,
        preferred: Option<ProviderKind>,
    ) -> Result<ModelResponse> {
        let table_config = select_model(task.task_type);
        let config = match preferred {
            Some(kind) => ModelConfig {
                model: self
                    .provider(kind)
                    .map(|p| p.default_model().to_owned())
                    .unwrap_or_else(|| table_config.model.clone()),
                provider: kind,
                temperature: table_config.temperature,
                max_tokens: table_config.max_tokens,
            },
            None => table_config,
        };

        let primary = config.provider;
        debug!(
            task = ?task.task_type,
            provider = %primary,
            model = %config.model,
            "routing task"
        );

        let mut attempts: Vec<String> = Vec::new();

        match self.attempt(primary, task, &config).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                warn!(
                    provider = %primary,
                    error = %err,
                    "primary provider failed, walking fallback order"
                );
                attempts.push(format!("{primary}: {err}"));
            }
        }

        for kind in FALLBACK_ORDER {
            // Never retry the provider that just failed.
            if kind == primary {
                continue;
            }
            let Some(provider) = self.provider(kind) else {
                continue;
            };
            // Not configured means unavailable, not an attempt.
            if !provider.is_configured() {
                continue;
            }

            let fallback_config = ModelConfig {
                provider: kind,
                model: provider.default_model().to_owned(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            };

            match self.attempt(kind, task, &fallback_config).await {
                Ok(response) => {
                    info!(
                        provider = %kind,
                        model = %response.model,
                        "fallback provider served the task"
                    );
                    return Ok(response);
                }
                Err(err) => {
                    warn!(provider = %kind, error = %err, "fallback provider failed");
                    attempts.push(format!("{kind}: {err}"));
                }
            }
        }

        Err(ProviderError::AllProvidersExhausted { attempts })
    }

    async fn attempt(
        &self,
        kind: ProviderKind,
        task: &TaskRequest,
        config: &ModelConfig,
    ) -> Result<ModelResponse> {
        let provider = self.provider(kind).ok_or_else(|| {
            ProviderError::NotConfigured(format!("no adapter registered for {kind}"))
        })?;

        let start = Instant::now();
        let content = provider.complete(task, config).await?;
        Ok(ModelResponse {
            content,
            provider: kind,
            model: config.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl std::fmt::Debug for ModelRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRouter")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.kind()).collect::<Vec<_>>(),
            )
            .field("available", &self.available_providers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct StubProvider {
        kind: ProviderKind,
        configured: bool,
        fail: bool,
        calls: Arc<AtomicU32>,
    }

    impl StubProvider {
        fn ok(kind: ProviderKind) -> (Box<dyn ModelProvider>, Arc<AtomicU32>) {
            Self::build(kind, true, false)
        }

        fn failing(kind: ProviderKind) -> (Box<dyn ModelProvider>, Arc<AtomicU32>) {
            Self::build(kind, true, true)
        }

        fn unconfigured(kind: ProviderKind) -> (Box<dyn ModelProvider>, Arc<AtomicU32>) {
            Self::build(kind, false, false)
        }

        fn build(
            kind: ProviderKind,
            configured: bool,
            fail: bool,
        ) -> (Box<dyn ModelProvider>, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            (
                Box::new(Self {
                    kind,
                    configured,
                    fail,
                    calls: calls.clone(),
                }),
                calls,
            )
        }
    }

    #[async_trait]
    impl ModelProvider for StubProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn default_model(&self) -> &str {
            "stub-model"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(&self, _task: &TaskRequest, _config: &ModelConfig) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.configured {
                return Err(ProviderError::NotConfigured("no key".into()));
            }
            if self.fail {
                return Err(ProviderError::RequestFailed("HTTP 503: unavailable".into()));
            }
            Ok(format!("hello from {}", self.kind))
        }
    }

    fn task() -> TaskRequest {
        TaskRequest::new(TaskType::Analysis, "Analyze this merchant.")
    }

    #[tokio::test]
    async fn primary_success_no_fallback() {
        let (claude, claude_calls) = StubProvider::ok(ProviderKind::Claude);
        let (openai, openai_calls) = StubProvider::ok(ProviderKind::OpenAi);
        let router = ModelRouter::new(vec![claude, openai]);

        // Analysis prefers Claude in the selection table.
        let response = router.route(&task(), None).await.unwrap();
        assert_eq!(response.provider, ProviderKind::Claude);
        assert_eq!(response.content, "hello from claude");
        assert_eq!(claude_calls.load(Ordering::SeqCst), 1);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fallback_reaches_first_healthy_provider_in_order() {
        let (claude, claude_calls) = StubProvider::failing(ProviderKind::Claude);
        let (openai, _) = StubProvider::ok(ProviderKind::OpenAi);
        let (gemini, gemini_calls) = StubProvider::ok(ProviderKind::Gemini);
        let router = ModelRouter::new(vec![claude, openai, gemini]);

        let response = router.route(&task(), None).await.unwrap();
        // OpenAI precedes Gemini in the fixed order.
        assert_eq!(response.provider, ProviderKind::OpenAi);
        // The failed primary was attempted exactly once.
        assert_eq!(claude_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gemini_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fallback_skips_unconfigured_providers() {
        let (claude, _) = StubProvider::failing(ProviderKind::Claude);
        let (openai, openai_calls) = StubProvider::unconfigured(ProviderKind::OpenAi);
        let (gemini, _) = StubProvider::ok(ProviderKind::Gemini);
        let router = ModelRouter::new(vec![claude, openai, gemini]);

        let response = router.route(&task(), None).await.unwrap();
        assert_eq!(response.provider, ProviderKind::Gemini);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn preferred_provider_overrides_task_table() {
        let (claude, claude_calls) = StubProvider::ok(ProviderKind::Claude);
        let (gemini, gemini_calls) = StubProvider::ok(ProviderKind::Gemini);
        let router = ModelRouter::new(vec![claude, gemini]);

        let response = router
            .route(&task(), Some(ProviderKind::Gemini))
            .await
            .unwrap();
        assert_eq!(response.provider, ProviderKind::Gemini);
        assert_eq!(response.model, "stub-model");
        assert_eq!(gemini_calls.load(Ordering::SeqCst), 1);
        assert_eq!(claude_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_providers_unconfigured_is_terminal() {
        let (claude, _) = StubProvider::unconfigured(ProviderKind::Claude);
        let (openai, _) = StubProvider::unconfigured(ProviderKind::OpenAi);
        let (gemini, _) = StubProvider::unconfigured(ProviderKind::Gemini);
        let router = ModelRouter::new(vec![claude, openai, gemini]);

        assert!(router.available_providers().is_empty());

        let err = router.route(&task(), None).await.unwrap_err();
        match err {
            ProviderError::AllProvidersExhausted { attempts } => {
                // Only the primary was actually attempted; the rest were
                // skipped as unconfigured.
                assert_eq!(attempts.len(), 1);
                assert!(attempts[0].starts_with("claude:"));
            }
            other => panic!("expected AllProvidersExhausted, got: {other}"),
        }
    }

    #[tokio::test]
    async fn all_providers_failing_accumulates_attempts() {
        let (claude, _) = StubProvider::failing(ProviderKind::Claude);
        let (openai, _) = StubProvider::failing(ProviderKind::OpenAi);
        let (gemini, _) = StubProvider::failing(ProviderKind::Gemini);
        let router = ModelRouter::new(vec![claude, openai, gemini]);

        let err = router.route(&task(), None).await.unwrap_err();
        match err {
            ProviderError::AllProvidersExhausted { attempts } => {
                assert_eq!(attempts.len(), 3);
            }
            other => panic!("expected AllProvidersExhausted, got: {other}"),
        }
    }

    #[test]
    fn available_providers_lists_configured_subset_in_order() {
        let (claude, _) = StubProvider::unconfigured(ProviderKind::Claude);
        let (openai, _) = StubProvider::ok(ProviderKind::OpenAi);
        let (gemini, _) = StubProvider::ok(ProviderKind::Gemini);
        let router = ModelRouter::new(vec![gemini, claude, openai]);

        assert_eq!(
            router.available_providers(),
            vec![ProviderKind::OpenAi, ProviderKind::Gemini]
        );
    }

    #[test]
    fn from_env_without_keys_has_no_available_providers() {
        temp_env::with_vars_unset(
            ["ANTHROPIC_API_KEY", "GOOGLE_GEMINI_API_KEY", "OPENAI_API_KEY"],
            || {
                let router = ModelRouter::from_env();
                assert!(router.available_providers().is_empty());
            },
        );
    }

    #[test]
    fn debug_output_lists_providers() {
        let (claude, _) = StubProvider::ok(ProviderKind::Claude);
        let router = ModelRouter::new(vec![claude]);
        let debug = format!("{router:?}");
        assert!(debug.contains("ModelRouter"));
        assert!(debug.contains("Claude"));
    }
}
