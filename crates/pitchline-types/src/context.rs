//! The proposal context: the aggregate root flowing through the pipeline.
//!
//! A [`ProposalContext`] is created once per request, exclusively owned by
//! one in-flight pipeline execution, mutated in place by every plugin that
//! runs, and handed to the downstream renderer once its stage is terminal.
//!
//! The `audit`, `citations`, `errors` and `warnings` collections are
//! append-only for the lifetime of a run: entries are added through the
//! `push_*`/`add_*` helpers and never removed or cleared.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::{AuditEntry, Citation};
use crate::request::{MerchantData, ProposalRequest, SalespersonInfo};
use crate::stage::Stage;

/// The mutable record threaded through every stage and plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalContext {
    /// Opaque identity assigned at creation. Never reassigned.
    pub id: Uuid,

    /// Pass-through requester identity.
    pub requester_id: String,

    /// Pass-through organization identifier.
    pub organization_id: String,

    /// Caller-supplied merchant data. Plugins may backfill blank fields
    /// (e.g. an inferred industry) but never overwrite caller values.
    pub merchant: MerchantData,

    /// Salesperson details passed through to the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salesperson: Option<SalespersonInfo>,

    /// Equipment the salesperson selected, verbatim from the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,

    /// Requested output format, verbatim from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,

    /// Populated only by enrichment plugins.
    #[serde(default)]
    pub enriched: EnrichedData,

    /// Populated only by reasoning plugins.
    #[serde(default)]
    pub pricing: PricingData,

    /// Current position in the stage state machine. Moves forward or into
    /// `Error`, never backwards.
    pub stage: Stage,

    /// One entry per plugin execution attempt, in attempt order.
    pub audit: Vec<AuditEntry>,

    /// Sourced claims backing numeric or factual output.
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Human-readable errors. Never cleared once the pipeline starts.
    #[serde(default)]
    pub errors: Vec<String>,

    /// Human-readable warnings. Never cleared once the pipeline starts.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ProposalContext {
    /// Create a context for one pipeline execution.
    ///
    /// All collections start empty, the stage is [`Stage::Init`], and one
    /// audit entry records the creation. No validation happens here; that
    /// is the first pipeline stage's job.
    pub fn new(request: ProposalRequest) -> Self {
        let mut ctx = Self {
            id: Uuid::new_v4(),
            requester_id: request.requester_id,
            organization_id: request.organization_id,
            merchant: request.merchant,
            salesperson: request.salesperson,
            equipment: request.equipment,
            output_format: request.output_format,
            enriched: EnrichedData::default(),
            pricing: PricingData::default(),
            stage: Stage::Init,
            audit: Vec::new(),
            citations: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        ctx.push_audit(AuditEntry::success(
            Stage::Init,
            "orchestrator",
            "context created",
            0,
        ));
        ctx
    }

    /// Append an audit entry.
    pub fn push_audit(&mut self, entry: AuditEntry) {
        self.audit.push(entry);
    }

    /// Append a human-readable error.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Append a human-readable warning.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Append a citation.
    pub fn add_citation(&mut self, citation: Citation) {
        self.citations.push(citation);
    }

    /// Whether the context has reached a terminal stage.
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

/// Data populated by enrichment plugins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichedData {
    /// Short description of the business.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Services or products the business offers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,

    /// Observed brand voice (e.g. "warm and family-oriented").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_tone: Option<String>,

    /// Testimonials, review counts, awards.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub social_proof: Vec<String>,

    /// URL or reference to the merchant's logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Data populated by reasoning plugins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingData {
    /// The merchant's current processor, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_processor: Option<String>,

    /// The merchant's current effective rate in percent, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rate: Option<f64>,

    /// The program this proposal offers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_program: Option<ProposedProgram>,

    /// Projected savings under the proposed program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_savings: Option<ProjectedSavings>,
}

/// The pricing program a proposal offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposedProgram {
    /// Zero-fee program: a customer service fee offsets processing costs.
    DualPricing,
    /// A percentage reduction off the merchant's current rate.
    RateReduction {
        /// Reduction as a percentage of the current rate (e.g. 20.0).
        percent: f64,
    },
    /// A flat processing rate.
    FlatRate {
        /// The proposed flat rate in percent.
        rate: f64,
    },
}

/// A monthly/annual savings projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedSavings {
    /// The rate the merchant would pay under the proposed program.
    pub proposed_rate: f64,

    /// Projected monthly processing cost under the proposed program.
    pub proposed_monthly_cost: f64,

    /// Projected monthly savings versus the current arrangement.
    pub monthly_savings: f64,

    /// Projected annual savings (monthly x 12).
    pub annual_savings: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn new_context_starts_at_init_with_one_audit_entry() {
        let ctx = ProposalContext::new(request());
        assert_eq!(ctx.stage, Stage::Init);
        assert_eq!(ctx.audit.len(), 1);
        assert_eq!(ctx.audit[0].plugin_id, "orchestrator");
        assert!(ctx.audit[0].success);
        assert!(ctx.citations.is_empty());
        assert!(ctx.errors.is_empty());
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn contexts_get_distinct_ids() {
        let a = ProposalContext::new(request());
        let b = ProposalContext::new(request());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn append_helpers() {
        let mut ctx = ProposalContext::new(request());
        ctx.add_error("business name is required");
        ctx.add_warning("email looks malformed");
        ctx.add_citation(Citation::new("interchange-table", "retail rates", 1.0));
        assert_eq!(ctx.errors.len(), 1);
        assert_eq!(ctx.warnings.len(), 1);
        assert_eq!(ctx.citations.len(), 1);
    }

    #[test]
    fn proposed_program_serde_tagging() {
        let json = serde_json::to_string(&ProposedProgram::DualPricing).unwrap();
        assert_eq!(json, r#"{"type":"dual_pricing"}"#);

        let parsed: ProposedProgram =
            serde_json::from_str(r#"{"type":"rate_reduction","percent":20.0}"#).unwrap();
        assert_eq!(parsed, ProposedProgram::RateReduction { percent: 20.0 });
    }

    #[test]
    fn context_serde_roundtrip() {
        let ctx = ProposalContext::new(request());
        let json = serde_json::to_string(&ctx).unwrap();
        let parsed: ProposalContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, ctx.id);
        assert_eq!(parsed.stage, Stage::Init);
        assert_eq!(parsed.audit.len(), 1);
    }
}
