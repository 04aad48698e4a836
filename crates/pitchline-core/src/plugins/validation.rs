//! Field validation plugin.
//!
//! Checks the caller-supplied merchant data. Required-field violations go
//! into `ctx.errors`; recommended-but-optional issues go into
//! `ctx.warnings`. When any required field is missing or invalid the
//! plugin returns `Err` after recording, so the attempt is audited as a
//! failure -- but the pipeline still proceeds (the orchestrator only
//! warns on validation errors).

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use pitchline_types::{ProposalContext, Stage};

use crate::plugin::{PluginDescriptor, PluginError, ProposalPlugin};

/// Validates merchant data at the start of the pipeline. No AI, no I/O.
pub struct FieldValidationPlugin;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

#[async_trait]
impl ProposalPlugin for FieldValidationPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            "field_validation",
            "Field Validation",
            "1.1.0",
            Stage::Validate,
            10,
        )
    }

    async fn run(&self, ctx: &mut ProposalContext) -> Result<(), PluginError> {
        let merchant = ctx.merchant.clone();
        let mut required_violations = 0usize;

        // Required fields.
        if merchant.business_name.trim().is_empty() {
            ctx.add_error("business name is required");
            required_violations += 1;
        }
        if merchant.monthly_volume <= 0.0 {
            ctx.add_error("monthly volume must be greater than zero");
            required_violations += 1;
        }
        if merchant.average_ticket <= 0.0 {
            ctx.add_error("average ticket must be greater than zero");
            required_violations += 1;
        }

        // Recommended fields.
        if merchant.owner_name.trim().is_empty() {
            ctx.add_warning("owner name is missing");
        }
        let email = merchant.email.trim();
        if email.is_empty() {
            ctx.add_warning("contact email is missing");
        } else if !email_regex().is_match(email) {
            ctx.add_warning(format!("email '{email}' looks malformed"));
        }
        let phone = merchant.phone.trim();
        if phone.is_empty() {
            ctx.add_warning("contact phone is missing");
        } else if phone.chars().filter(|c| c.is_ascii_digit()).count() < 10 {
            ctx.add_warning(format!("phone '{phone}' has fewer than 10 digits"));
        }
        if merchant.website.trim().is_empty() {
            ctx.add_warning("website is missing; web enrichment will be skipped");
        }
        if merchant.industry.trim().is_empty() {
            ctx.add_warning("industry is missing; merchant category will default to retail");
        }

        if required_violations > 0 {
            return Err(PluginError::Validation(format!(
                "{required_violations} required field(s) missing or invalid"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchline_types::{MerchantData, ProposalRequest};

    fn context_for(merchant: MerchantData) -> ProposalContext {
        ProposalContext::new(ProposalRequest {
            requester_id: "u".into(),
            organization_id: "o".into(),
            merchant,
            salesperson: None,
            equipment: Vec::new(),
            output_format: None,
        })
    }

    fn complete_merchant() -> MerchantData {
        MerchantData {
            business_name: "Blue Bottle Cafe".into(),
            owner_name: "Dana Alvarez".into(),
            email: "dana@bluebottle.example".into(),
            phone: "(555) 123-4567 x89".into(),
            website: "https://bluebottle.example".into(),
            industry: "coffee shop".into(),
            monthly_volume: 50_000.0,
            average_ticket: 12.5,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn complete_merchant_passes_cleanly() {
        let mut ctx = context_for(complete_merchant());
        FieldValidationPlugin.run(&mut ctx).await.unwrap();
        assert!(ctx.errors.is_empty());
        assert!(ctx.warnings.is_empty());
    }

    #[tokio::test]
    async fn missing_business_name_is_an_error_and_a_failed_run() {
        let mut merchant = complete_merchant();
        merchant.business_name = "".into();
        let mut ctx = context_for(merchant);

        let err = FieldValidationPlugin.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, PluginError::Validation(_)));
        assert!(ctx.errors.iter().any(|e| e.contains("business name")));
    }

    #[tokio::test]
    async fn zero_volume_and_ticket_are_errors() {
        let mut merchant = complete_merchant();
        merchant.monthly_volume = 0.0;
        merchant.average_ticket = -5.0;
        let mut ctx = context_for(merchant);

        let err = FieldValidationPlugin.run(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("2 required"));
        assert_eq!(ctx.errors.len(), 2);
    }

    #[tokio::test]
    async fn malformed_email_and_short_phone_are_warnings_only() {
        let mut merchant = complete_merchant();
        merchant.email = "not-an-email".into();
        merchant.phone = "555-12".into();
        let mut ctx = context_for(merchant);

        FieldValidationPlugin.run(&mut ctx).await.unwrap();
        assert!(ctx.errors.is_empty());
        assert!(ctx.warnings.iter().any(|w| w.contains("not-an-email")));
        assert!(ctx.warnings.iter().any(|w| w.contains("fewer than 10 digits")));
    }

    #[tokio::test]
    async fn missing_optionals_are_warnings() {
        let merchant = MerchantData {
            business_name: "Corner Store".into(),
            monthly_volume: 10_000.0,
            average_ticket: 20.0,
            ..Default::default()
        };
        let mut ctx = context_for(merchant);

        FieldValidationPlugin.run(&mut ctx).await.unwrap();
        assert!(ctx.errors.is_empty());
        // owner, email, phone, website, industry
        assert_eq!(ctx.warnings.len(), 5);
    }

    #[test]
    fn descriptor_is_validate_stage() {
        let desc = FieldValidationPlugin.descriptor();
        assert_eq!(desc.id, "field_validation");
        assert_eq!(desc.stage, Stage::Validate);
    }
}
