//! # pitchline-types
//!
//! Core type definitions for the pitchline proposal-generation pipeline.
//!
//! This crate is the foundation of the dependency graph; `pitchline-core`
//! builds on it. It contains:
//!
//! - **[`stage`]** -- The [`Stage`] state machine the pipeline moves through
//! - **[`context`]** -- [`ProposalContext`], the mutable record threaded
//!   through every stage and plugin
//! - **[`audit`]** -- [`AuditEntry`] and [`Citation`] execution metadata
//! - **[`request`]** -- [`ProposalRequest`] and the merchant data supplied
//!   by the caller
//! - **[`error`]** -- [`PitchlineError`], the top-level error type

pub mod audit;
pub mod context;
pub mod error;
pub mod request;
pub mod stage;

pub use audit::{AuditEntry, Citation};
pub use context::{EnrichedData, PricingData, ProjectedSavings, ProposalContext, ProposedProgram};
pub use error::{PitchlineError, Result};
pub use request::{MerchantData, ProposalRequest, SalespersonInfo};
pub use stage::Stage;
