//! Caller-facing request types.
//!
//! A [`ProposalRequest`] is the only input to the pipeline. The merchant
//! data it carries is the only caller-supplied business data; everything
//! else on the context is populated by plugins.

use serde::{Deserialize, Serialize};

/// A request to generate a proposal for one merchant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRequest {
    /// Opaque identifier of the user making the request.
    pub requester_id: String,

    /// Opaque identifier of the requester's organization.
    pub organization_id: String,

    /// The merchant the proposal is for.
    pub merchant: MerchantData,

    /// The salesperson whose details appear on the proposal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salesperson: Option<SalespersonInfo>,

    /// Equipment the salesperson selected for the quote, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,

    /// Requested output format for the downstream renderer
    /// (e.g. "pdf", "docx"). Not interpreted by this core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

/// Merchant business data supplied by the caller.
///
/// Only `business_name`, `monthly_volume` and `average_ticket` are
/// required by validation; the rest are recommended.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MerchantData {
    /// Legal or trading name of the business.
    pub business_name: String,

    /// Owner or primary contact name.
    #[serde(default)]
    pub owner_name: String,

    /// Contact email address.
    #[serde(default)]
    pub email: String,

    /// Contact phone number.
    #[serde(default)]
    pub phone: String,

    /// Business website URL, used by web enrichment.
    #[serde(default)]
    pub website: String,

    /// Free-text industry description (e.g. "fast casual restaurant").
    #[serde(default)]
    pub industry: String,

    /// Monthly card processing volume in dollars.
    #[serde(default)]
    pub monthly_volume: f64,

    /// Average transaction size in dollars.
    #[serde(default)]
    pub average_ticket: f64,

    /// Free-text notes from the salesperson.
    #[serde(default)]
    pub notes: String,
}

/// Salesperson details passed through to the rendered proposal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalespersonInfo {
    /// Display name.
    pub name: String,

    /// Contact email.
    #[serde(default)]
    pub email: String,

    /// Contact phone.
    #[serde(default)]
    pub phone: String,
}
