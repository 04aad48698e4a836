//! The pipeline stage state machine.
//!
//! [`Orchestrator::execute`] creates the context, drives the fixed stage
//! sequence through the plugin manager, and decides when the pipeline is
//! complete or has fatally failed. Individual plugin failures are already
//! isolated by the manager; the orchestrator's error path exists for the
//! catastrophic cases (cancellation, and anything escaping the manager's
//! isolation).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use pitchline_types::{ProposalContext, ProposalRequest, Result, Stage};

use crate::manager::PluginManager;

/// Drives one proposal request through the fixed stage sequence.
pub struct Orchestrator {
    manager: Arc<PluginManager>,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Create an orchestrator over an injected plugin registry.
    pub fn new(manager: Arc<PluginManager>) -> Self {
        Self::with_cancellation(manager, CancellationToken::new())
    }

    /// Create an orchestrator with a caller-owned cancellation token,
    /// honored before each stage and each plugin dispatch.
    pub fn with_cancellation(manager: Arc<PluginManager>, cancel: CancellationToken) -> Self {
        Self { manager, cancel }
    }

    /// A clone of the cancellation token, for callers that want to abort
    /// an in-flight pipeline.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the pipeline for one request and return the final context.
    ///
    /// The returned context is terminal: `stage` is [`Stage::Complete`],
    /// or [`Stage::Error`] with a describing entry in `errors`. Failures
    /// never surface as a Rust error from this method -- the context's
    /// `errors`/`warnings`/`stage` fields are the whole story.
    pub async fn execute(&self, request: ProposalRequest) -> ProposalContext {
        let mut ctx = ProposalContext::new(request);
        info!(
            proposal = %ctx.id,
            requester = %ctx.requester_id,
            merchant = %ctx.merchant.business_name,
            "pipeline started"
        );

        for stage in Stage::EXECUTION_ORDER {
            ctx.stage = stage;
            debug!(proposal = %ctx.id, stage = %stage, "entering stage");

            if let Err(err) = self.manager.run_stage(stage, &mut ctx, &self.cancel).await {
                error!(proposal = %ctx.id, stage = %stage, error = %err, "pipeline halted");
                ctx.add_error(format!("stage '{stage}' failed: {err}"));
                ctx.stage = Stage::Error;
                return ctx;
            }

            // Validation failures are recorded but deliberately do not
            // halt the pipeline; downstream consumers see the errors list.
            if stage == Stage::Validate && !ctx.errors.is_empty() {
                warn!(
                    proposal = %ctx.id,
                    errors = ctx.errors.len(),
                    "validation recorded errors, proceeding anyway"
                );
            }
        }

        ctx.stage = Stage::Complete;
        info!(
            proposal = %ctx.id,
            audit_entries = ctx.audit.len(),
            errors = ctx.errors.len(),
            warnings = ctx.warnings.len(),
            "pipeline complete"
        );
        ctx
    }

    /// Produce a serializable summary of one execution. Pure projection,
    /// no side effects.
    pub fn audit_log(&self, ctx: &ProposalContext) -> Result<String> {
        let mut plugins_run: Vec<String> = Vec::new();
        let mut models_used: Vec<String> = Vec::new();
        for entry in &ctx.audit {
            if entry.plugin_id != "orchestrator" && !plugins_run.contains(&entry.plugin_id) {
                plugins_run.push(entry.plugin_id.clone());
            }
            if let Some(model) = &entry.model {
                if !models_used.contains(model) {
                    models_used.push(model.clone());
                }
            }
        }

        let summary = AuditSummary {
            proposal_id: ctx.id.to_string(),
            requester_id: &ctx.requester_id,
            stage: ctx.stage,
            plugins_run,
            models_used,
            total_duration_ms: ctx.audit.iter().filter_map(|e| e.duration_ms).sum(),
            errors: &ctx.errors,
            warnings: &ctx.warnings,
            citation_count: ctx.citations.len(),
            started_at: ctx.audit.first().map(|e| e.timestamp),
            finished_at: ctx.audit.last().map(|e| e.timestamp),
        };
        Ok(serde_json::to_string_pretty(&summary)?)
    }
}

#[derive(Serialize)]
struct AuditSummary<'a> {
    proposal_id: String,
    requester_id: &'a str,
    stage: Stage,
    plugins_run: Vec<String>,
    models_used: Vec<String>,
    total_duration_ms: u64,
    errors: &'a [String],
    warnings: &'a [String],
    citation_count: usize,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{PluginDescriptor, PluginError, ProposalPlugin};
    use async_trait::async_trait;
    use pitchline_types::{AuditEntry, MerchantData};

    struct StampPlugin {
        stage: Stage,
    }

    #[async_trait]
    impl ProposalPlugin for StampPlugin {
        fn descriptor(&self) -> PluginDescriptor {
            PluginDescriptor::new(
                format!("stamp_{}", self.stage),
                "Stamp",
                "1.0.0",
                self.stage,
                10,
            )
        }

        async fn run(&self, ctx: &mut ProposalContext) -> std::result::Result<(), PluginError> {
            // The manager must have advanced the context to our stage.
            assert_eq!(ctx.stage, self.stage);
            Ok(())
        }
    }

    fn request() -> ProposalRequest {
        ProposalRequest {
            requester_id: "user-1".into(),
            organization_id: "org-1".into(),
            merchant: MerchantData {
                business_name: "Blue Bottle Cafe".into(),
                monthly_volume: 50_000.0,
                average_ticket: 12.5,
                ..Default::default()
            },
            salesperson: None,
            equipment: Vec::new(),
            output_format: None,
        }
    }

    #[tokio::test]
    async fn all_stages_run_in_order_then_complete() {
        let manager = Arc::new(PluginManager::new());
        for stage in Stage::EXECUTION_ORDER {
            manager.register(Arc::new(StampPlugin { stage }));
        }
        let orchestrator = Orchestrator::new(manager);

        let ctx = orchestrator.execute(request()).await;
        assert_eq!(ctx.stage, Stage::Complete);

        // Audit stages appear in forward order, never regressing.
        let positions: Vec<u8> = ctx.audit.iter().map(|e| e.stage.position()).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        // Creation entry + one per stage plugin.
        assert_eq!(ctx.audit.len(), 1 + Stage::EXECUTION_ORDER.len());
    }

    #[tokio::test]
    async fn empty_registry_still_completes() {
        let orchestrator = Orchestrator::new(Arc::new(PluginManager::new()));
        let ctx = orchestrator.execute(request()).await;
        assert_eq!(ctx.stage, Stage::Complete);
        assert_eq!(ctx.audit.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_before_start_halts_with_error_stage() {
        let manager = Arc::new(PluginManager::new());
        manager.register(Arc::new(StampPlugin {
            stage: Stage::Validate,
        }));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let orchestrator = Orchestrator::with_cancellation(manager, cancel);

        let ctx = orchestrator.execute(request()).await;
        assert_eq!(ctx.stage, Stage::Error);
        assert!(ctx.errors.iter().any(|e| e.contains("cancelled")));
        // No plugin was dispatched.
        assert_eq!(ctx.audit.len(), 1);
    }

    #[tokio::test]
    async fn audit_log_summary_fields() {
        let manager = Arc::new(PluginManager::new());
        manager.register(Arc::new(StampPlugin {
            stage: Stage::Validate,
        }));
        let orchestrator = Orchestrator::new(manager);

        let mut ctx = orchestrator.execute(request()).await;
        ctx.push_audit(
            AuditEntry::success(Stage::Enrich, "web_enrichment", "extracted", 120)
                .with_model("gpt-4o"),
        );

        let log = orchestrator.audit_log(&ctx).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(parsed["stage"], "complete");
        assert_eq!(parsed["models_used"], serde_json::json!(["gpt-4o"]));
        assert!(parsed["plugins_run"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p == "stamp_validate"));
        assert_eq!(parsed["citation_count"], 0);
    }
}
