//! Built-in proposal plugins.
//!
//! - [`FieldValidationPlugin`] -- required/recommended field checks, no I/O
//! - [`WebEnrichmentPlugin`] -- website fetch plus AI extraction
//! - [`InterchangeCostPlugin`] -- pure interchange-cost computation

pub mod enrichment;
pub mod interchange;
pub mod validation;

pub use enrichment::WebEnrichmentPlugin;
pub use interchange::{
    calculate_interchange, calculate_savings, InterchangeBreakdown, InterchangeCostPlugin,
    MerchantCategory,
};
pub use validation::FieldValidationPlugin;
