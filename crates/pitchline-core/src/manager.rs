//! The process-wide plugin registry and stage executor.
//!
//! [`PluginManager`] owns the registry, resolves the enabled plugins for a
//! stage in deterministic priority order, and runs them sequentially
//! against a context with per-plugin failure isolation: one plugin
//! erroring (or panicking) is recorded and does not stop its siblings.
//!
//! The registry is mutated rarely (startup, admin feature toggles) and
//! read on every pipeline execution; a `parking_lot` read-write lock keeps
//! reads cheap and toggle writes consistent. Registry mutations take
//! effect on the next stage execution -- `run_stage` snapshots the
//! resolved plugin list once, so a plugin mid-run always finishes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use pitchline_types::{AuditEntry, PitchlineError, ProposalContext, Stage};

use crate::plugin::{PluginDescriptor, ProposalPlugin};

struct RegisteredPlugin {
    plugin: Arc<dyn ProposalPlugin>,
    descriptor: PluginDescriptor,
    enabled: bool,
    /// Monotonic registration sequence: the stable tie-break for equal
    /// priorities.
    seq: u64,
}

/// The process-wide plugin registry.
///
/// Inject an `Arc<PluginManager>` into the
/// [`Orchestrator`](crate::Orchestrator) rather than reaching for an
/// ambient singleton; tests build a fresh registry per test.
pub struct PluginManager {
    registry: RwLock<HashMap<String, RegisteredPlugin>>,
    next_seq: AtomicU64,
}

impl PluginManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Add or overwrite a plugin by its descriptor id. Newly registered
    /// plugins start enabled. Re-registering an id assigns a fresh
    /// position in the registration order.
    pub fn register(&self, plugin: Arc<dyn ProposalPlugin>) {
        let descriptor = plugin.descriptor();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        debug!(
            plugin = %descriptor.id,
            stage = %descriptor.stage,
            priority = descriptor.priority,
            "registering plugin"
        );
        self.registry.write().insert(
            descriptor.id.clone(),
            RegisteredPlugin {
                plugin,
                descriptor,
                enabled: true,
                seq,
            },
        );
    }

    /// Remove a plugin. Returns `true` if it was registered.
    pub fn unregister(&self, id: &str) -> bool {
        self.registry.write().remove(id).is_some()
    }

    /// Toggle a plugin. Takes effect on the next stage execution.
    /// Returns `false` if the id is unknown.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        match self.registry.write().get_mut(id) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Whether a plugin is registered and enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.registry.read().get(id).map(|e| e.enabled).unwrap_or(false)
    }

    /// All registered descriptors, in registration order.
    pub fn descriptors(&self) -> Vec<PluginDescriptor> {
        let registry = self.registry.read();
        let mut entries: Vec<_> = registry.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    /// The enabled plugins tagged with `stage`, sorted ascending by
    /// priority with ties preserved in registration order.
    ///
    /// This ordering is a designed contract, not an implementation
    /// detail: later plugins may depend on fields set by earlier ones.
    pub fn plugins_for_stage(&self, stage: Stage) -> Vec<(Arc<dyn ProposalPlugin>, PluginDescriptor)> {
        let registry = self.registry.read();
        let mut entries: Vec<_> = registry
            .values()
            .filter(|e| e.enabled && e.descriptor.stage == stage)
            .collect();
        entries.sort_by_key(|e| (e.descriptor.priority, e.seq));
        entries
            .iter()
            .map(|e| (e.plugin.clone(), e.descriptor.clone()))
            .collect()
    }

    /// Run every enabled plugin for `stage` against the context, in
    /// order, isolating failures per plugin.
    ///
    /// Each attempt appends one audit entry (success or failure). An
    /// `Err` return or a panic from a plugin is recorded into
    /// `ctx.errors` plus a failed audit entry, and the remaining plugins
    /// in the stage still run.
    ///
    /// # Errors
    ///
    /// Only cancellation propagates: [`PitchlineError::Cancelled`] when
    /// the token fires before a plugin is dispatched.
    pub async fn run_stage(
        &self,
        stage: Stage,
        ctx: &mut ProposalContext,
        cancel: &CancellationToken,
    ) -> Result<(), PitchlineError> {
        let plugins = self.plugins_for_stage(stage);
        if plugins.is_empty() {
            debug!(stage = %stage, "no plugins registered for stage");
            return Ok(());
        }

        for (plugin, descriptor) in plugins {
            if cancel.is_cancelled() {
                return Err(PitchlineError::Cancelled);
            }

            debug!(stage = %stage, plugin = %descriptor.id, "running plugin");
            let start = Instant::now();
            let outcome = std::panic::AssertUnwindSafe(plugin.run(ctx))
                .catch_unwind()
                .await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Ok(Ok(())) => {
                    ctx.push_audit(AuditEntry::success(
                        stage,
                        &descriptor.id,
                        "completed",
                        elapsed_ms,
                    ));
                }
                Ok(Err(err)) => {
                    warn!(
                        stage = %stage,
                        plugin = %descriptor.id,
                        error = %err,
                        "plugin failed, continuing with remaining plugins"
                    );
                    ctx.add_error(format!("plugin '{}' failed: {err}", descriptor.id));
                    ctx.push_audit(AuditEntry::failure(
                        stage,
                        &descriptor.id,
                        "failed",
                        elapsed_ms,
                        err.to_string(),
                    ));
                }
                Err(panic) => {
                    let reason = panic_message(panic);
                    error!(
                        stage = %stage,
                        plugin = %descriptor.id,
                        reason = %reason,
                        "plugin panicked, continuing with remaining plugins"
                    );
                    ctx.add_error(format!("plugin '{}' panicked: {reason}", descriptor.id));
                    ctx.push_audit(AuditEntry::failure(
                        stage,
                        &descriptor.id,
                        "panicked",
                        elapsed_ms,
                        reason,
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".into()
    }
}
