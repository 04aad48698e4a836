//! Pipeline engine for pitchline.
//!
//! This crate drives a proposal through the fixed stage sequence:
//!
//! 1. **[`plugin`]** -- the [`ProposalPlugin`] trait and descriptor
//! 2. **[`manager`]** -- the process-wide [`PluginManager`] registry and
//!    stage executor with per-plugin failure isolation
//! 3. **[`orchestrator`]** -- the [`Orchestrator`] stage state machine
//! 4. **[`plugins`]** -- the built-in plugins: field validation, web
//!    enrichment, interchange-cost calculation
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pitchline_core::{Orchestrator, PluginManager};
//! use pitchline_core::plugins::{FieldValidationPlugin, InterchangeCostPlugin, WebEnrichmentPlugin};
//! use pitchline_llm::ModelRouter;
//!
//! let manager = Arc::new(PluginManager::new());
//! let router = Arc::new(ModelRouter::from_env());
//! manager.register(Arc::new(FieldValidationPlugin));
//! manager.register(Arc::new(WebEnrichmentPlugin::new(router)));
//! manager.register(Arc::new(InterchangeCostPlugin));
//!
//! let orchestrator = Orchestrator::new(manager);
//! let context = orchestrator.execute(request).await;
//! assert!(context.is_terminal());
//! ```

pub mod manager;
pub mod orchestrator;
pub mod plugin;
pub mod plugins;

pub use manager::PluginManager;
pub use orchestrator::Orchestrator;
pub use plugin::{PluginDescriptor, PluginError, ProposalPlugin};
