//! Interchange cost calculator plugin.
//!
//! Pure computation, no AI call. Runs in the enrich stage at lower
//! priority than web enrichment so it can use an inferred industry
//! category. Splits monthly volume across the card-network buckets using
//! a default card mix, prices each bucket from fixed interchange and
//! assessment tables, and projects savings under the proposed program.
//!
//! All monetary outputs are rounded to two decimal places.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pitchline_types::{
    AuditEntry, Citation, ProjectedSavings, ProposalContext, ProposedProgram, Stage,
};

use crate::plugin::{PluginDescriptor, PluginError, ProposalPlugin};

// ── Fixed rate tables ───────────────────────────────────────────────────

/// The card networks volume is split across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardNetwork {
    Visa,
    Mastercard,
    Discover,
    Amex,
    Debit,
}

/// Default card mix: share of monthly volume per network.
const CARD_MIX: [(CardNetwork, f64); 5] = [
    (CardNetwork::Visa, 0.45),
    (CardNetwork::Mastercard, 0.30),
    (CardNetwork::Discover, 0.05),
    (CardNetwork::Amex, 0.10),
    (CardNetwork::Debit, 0.10),
];

/// Per-bucket interchange percentage rate.
fn interchange_rate(network: CardNetwork, card_present: bool) -> f64 {
    if card_present {
        match network {
            CardNetwork::Visa => 0.0165,
            CardNetwork::Mastercard => 0.0170,
            CardNetwork::Discover => 0.0168,
            CardNetwork::Amex => 0.0230,
            CardNetwork::Debit => 0.0080,
        }
    } else {
        match network {
            CardNetwork::Visa => 0.0195,
            CardNetwork::Mastercard => 0.0200,
            CardNetwork::Discover => 0.0198,
            CardNetwork::Amex => 0.0250,
            CardNetwork::Debit => 0.0105,
        }
    }
}

/// Per-transaction fee; regulated debit uses a different flat fee.
fn per_transaction_fee(network: CardNetwork) -> f64 {
    match network {
        CardNetwork::Debit => 0.21,
        _ => 0.10,
    }
}

/// Network assessment fee as a fraction of bucket volume. Amex runs
/// slightly higher than the other networks.
fn assessment_rate(network: CardNetwork) -> f64 {
    match network {
        CardNetwork::Amex => 0.00165,
        _ => 0.00130,
    }
}

/// Service fee collected from customers under the dual-pricing program.
const DUAL_PRICING_SERVICE_FEE: f64 = 0.0399;

// ── Category normalization ──────────────────────────────────────────────

/// Normalized merchant categories, matched by keyword from the free-text
/// industry description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantCategory {
    Restaurant,
    Ecommerce,
    Grocery,
    Healthcare,
    Services,
    Retail,
}

impl MerchantCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MerchantCategory::Restaurant => "restaurant",
            MerchantCategory::Ecommerce => "ecommerce",
            MerchantCategory::Grocery => "grocery",
            MerchantCategory::Healthcare => "healthcare",
            MerchantCategory::Services => "services",
            MerchantCategory::Retail => "retail",
        }
    }
}

impl std::fmt::Display for MerchantCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a free-text industry description to a category, defaulting to
/// retail when nothing matches.
pub fn normalize_category(industry: &str) -> MerchantCategory {
    let text = industry.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if matches(&["restaurant", "cafe", "coffee", "food", "pizza", "diner", "bar", "bakery"]) {
        MerchantCategory::Restaurant
    } else if matches(&["ecommerce", "e-commerce", "online", "web store", "webshop"]) {
        MerchantCategory::Ecommerce
    } else if matches(&["grocery", "supermarket", "convenience", "market"]) {
        MerchantCategory::Grocery
    } else if matches(&["health", "medical", "dental", "clinic", "pharmacy", "veterinar"]) {
        MerchantCategory::Healthcare
    } else if matches(&[
        "salon", "repair", "cleaning", "consult", "service", "plumb", "hvac", "landscap", "auto",
        "law", "account",
    ]) {
        MerchantCategory::Services
    } else {
        MerchantCategory::Retail
    }
}

/// Card-present unless the industry text says the business sells online.
pub fn infer_card_present(industry: &str) -> bool {
    let text = industry.to_lowercase();
    !(text.contains("ecommerce") || text.contains("e-commerce") || text.contains("online"))
}

// ── Calculator ──────────────────────────────────────────────────────────

/// One card network's share of the wholesale cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkBucket {
    pub network: CardNetwork,
    /// Bucket volume in dollars.
    pub volume: f64,
    /// Bucket transaction count.
    pub transactions: u64,
    /// Interchange cost: volume rate plus per-transaction fees.
    pub interchange_cost: f64,
    /// Network assessment fee on bucket volume.
    pub assessment_fee: f64,
}

/// Dual-pricing (zero-fee) program projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualPricingProjection {
    /// Service fee collected from customers, as a percentage.
    pub service_fee_rate: f64,
    /// Monthly service-fee revenue at full collection.
    pub service_fee_revenue: f64,
    /// Wholesale cost left with the merchant after service-fee revenue.
    /// Never negative.
    pub net_cost_to_merchant: f64,
    /// Monthly cost eliminated by the program.
    pub monthly_savings: f64,
    /// Annual cost eliminated by the program.
    pub annual_savings: f64,
}

/// Full wholesale-cost breakdown for one merchant month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterchangeBreakdown {
    pub category: MerchantCategory,
    pub card_present: bool,
    /// Monthly volume the breakdown was computed from.
    pub monthly_volume: f64,
    /// Estimated transaction count: volume / average ticket, rounded.
    pub transaction_count: u64,
    pub buckets: Vec<NetworkBucket>,
    pub total_interchange: f64,
    pub total_assessments: f64,
    /// Interchange plus assessments.
    pub total_wholesale_cost: f64,
    /// Wholesale cost as a percentage of volume.
    pub effective_rate: f64,
    pub dual_pricing: DualPricingProjection,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute the monthly wholesale processing cost for a merchant.
///
/// # Errors
///
/// [`PluginError::ExecutionFailed`] when volume or ticket is not positive.
pub fn calculate_interchange(
    monthly_volume: f64,
    average_ticket: f64,
    category: MerchantCategory,
    card_present: bool,
) -> Result<InterchangeBreakdown, PluginError> {
    if monthly_volume <= 0.0 || average_ticket <= 0.0 {
        return Err(PluginError::ExecutionFailed(
            "monthly volume and average ticket must be positive".into(),
        ));
    }

    let transaction_count = (monthly_volume / average_ticket).round() as u64;

    let mut buckets = Vec::with_capacity(CARD_MIX.len());
    let mut total_interchange = 0.0;
    let mut total_assessments = 0.0;

    for (network, share) in CARD_MIX {
        let volume = monthly_volume * share;
        let transactions = (transaction_count as f64 * share).round() as u64;
        let interchange_cost = volume * interchange_rate(network, card_present)
            + transactions as f64 * per_transaction_fee(network);
        let assessment_fee = volume * assessment_rate(network);

        total_interchange += interchange_cost;
        total_assessments += assessment_fee;
        buckets.push(NetworkBucket {
            network,
            volume: round2(volume),
            transactions,
            interchange_cost: round2(interchange_cost),
            assessment_fee: round2(assessment_fee),
        });
    }

    let total_wholesale_cost = total_interchange + total_assessments;
    let effective_rate = round2(total_wholesale_cost / monthly_volume * 100.0);

    let service_fee_revenue = monthly_volume * DUAL_PRICING_SERVICE_FEE;
    let net_cost_to_merchant = (total_wholesale_cost - service_fee_revenue).max(0.0);
    let monthly_savings = total_wholesale_cost - net_cost_to_merchant;

    Ok(InterchangeBreakdown {
        category,
        card_present,
        monthly_volume,
        transaction_count,
        buckets,
        total_interchange: round2(total_interchange),
        total_assessments: round2(total_assessments),
        total_wholesale_cost: round2(total_wholesale_cost),
        effective_rate,
        dual_pricing: DualPricingProjection {
            service_fee_rate: round2(DUAL_PRICING_SERVICE_FEE * 100.0),
            service_fee_revenue: round2(service_fee_revenue),
            net_cost_to_merchant: round2(net_cost_to_merchant),
            monthly_savings: round2(monthly_savings),
            annual_savings: round2(monthly_savings * 12.0),
        },
    })
}

/// Project savings for a proposed program against the current rate.
///
/// Dual pricing yields a proposed rate and proposed monthly cost of
/// exactly zero. Rate-reduction and flat-rate projections are reported as
/// computed, even when negative, so the comparison stays visible.
pub fn calculate_savings(
    current_rate: f64,
    monthly_volume: f64,
    program: &ProposedProgram,
) -> ProjectedSavings {
    let current_cost = monthly_volume * current_rate / 100.0;

    let (proposed_rate, proposed_monthly_cost) = match program {
        ProposedProgram::DualPricing => (0.0, 0.0),
        ProposedProgram::RateReduction { percent } => {
            let rate = current_rate * (1.0 - percent / 100.0);
            (round2(rate), round2(monthly_volume * rate / 100.0))
        }
        ProposedProgram::FlatRate { rate } => {
            (round2(*rate), round2(monthly_volume * rate / 100.0))
        }
    };

    let monthly_savings = round2(current_cost - proposed_monthly_cost);
    ProjectedSavings {
        proposed_rate,
        proposed_monthly_cost,
        monthly_savings,
        annual_savings: round2(monthly_savings * 12.0),
    }
}

// ── Plugin ──────────────────────────────────────────────────────────────

/// Computes the interchange breakdown and projected savings into
/// `ctx.pricing`.
pub struct InterchangeCostPlugin;

#[async_trait]
impl ProposalPlugin for InterchangeCostPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        // Runs after web enrichment so an inferred industry is visible.
        PluginDescriptor::new(
            "interchange_cost",
            "Interchange Cost Calculator",
            "1.3.0",
            Stage::Enrich,
            20,
        )
    }

    async fn run(&self, ctx: &mut ProposalContext) -> Result<(), PluginError> {
        let volume = ctx.merchant.monthly_volume;
        let ticket = ctx.merchant.average_ticket;
        let industry = ctx.merchant.industry.clone();

        let category = normalize_category(&industry);
        let card_present = infer_card_present(&industry);
        let breakdown = calculate_interchange(volume, ticket, category, card_present)?;

        debug!(
            category = %category,
            card_present,
            effective_rate = breakdown.effective_rate,
            "interchange computed"
        );

        // The computed wholesale rate stands in for the current rate when
        // the caller did not supply one.
        let current_rate = ctx.pricing.current_rate.unwrap_or(breakdown.effective_rate);
        if ctx.pricing.current_rate.is_none() {
            ctx.pricing.current_rate = Some(breakdown.effective_rate);
        }
        let program = ctx
            .pricing
            .proposed_program
            .clone()
            .unwrap_or(ProposedProgram::DualPricing);
        let savings = calculate_savings(current_rate, volume, &program);
        let annual_savings = savings.annual_savings;
        ctx.pricing.proposed_program = Some(program);
        ctx.pricing.projected_savings = Some(savings);

        ctx.add_citation(Citation::new(
            "interchange_rate_tables",
            "Wholesale cost computed from published card-network interchange and assessment schedules",
            0.95,
        ));
        ctx.add_citation(Citation::new(
            "category_normalization",
            format!("Merchant categorized as '{category}' from industry description '{industry}'"),
            0.8,
        ));
        ctx.push_audit(
            AuditEntry::success(Stage::Enrich, "interchange_cost", "interchange computed", 0)
                .with_metadata(serde_json::json!({
                    "monthly_volume": volume,
                    "category": category.as_str(),
                    "effective_rate": breakdown.effective_rate,
                    "projected_annual_savings": annual_savings,
                })),
        );
        Ok(())
    }
}
