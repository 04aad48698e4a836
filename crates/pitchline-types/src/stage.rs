//! The pipeline stage state machine.
//!
//! A proposal context moves forward through the fixed sequence
//! `init -> validate -> enrich -> reason -> compile -> complete`, or
//! sideways into the terminal `error` state. It never moves backwards.

use serde::{Deserialize, Serialize};

/// A position in the proposal pipeline's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Context created, no stage has run yet.
    Init,
    /// Field-level validation of the merchant data.
    Validate,
    /// Enrichment (website extraction, interchange computation).
    Enrich,
    /// Reasoning over enriched data.
    Reason,
    /// Assembly of the final proposal content.
    Compile,
    /// Terminal: every stage ran without a catastrophic failure.
    Complete,
    /// Terminal: a stage failed catastrophically or the run was cancelled.
    Error,
}

impl Stage {
    /// The stages the orchestrator executes, in order. `Init`, `Complete`
    /// and `Error` are bookend states and never appear here.
    pub const EXECUTION_ORDER: [Stage; 4] =
        [Stage::Validate, Stage::Enrich, Stage::Reason, Stage::Compile];

    /// Position of this stage in the forward sequence. `Error` sorts last
    /// so that "never moves backwards" can be checked with a plain `>=`.
    pub fn position(&self) -> u8 {
        match self {
            Stage::Init => 0,
            Stage::Validate => 1,
            Stage::Enrich => 2,
            Stage::Reason => 3,
            Stage::Compile => 4,
            Stage::Complete => 5,
            Stage::Error => 6,
        }
    }

    /// Whether the pipeline has finished (successfully or not).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }

    /// The snake_case name used in audit entries and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Validate => "validate",
            Stage::Enrich => "enrich",
            Stage::Reason => "reason",
            Stage::Compile => "compile",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_order_is_forward() {
        let positions: Vec<u8> = Stage::EXECUTION_ORDER.iter().map(|s| s.position()).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn terminal_states() {
        assert!(Stage::Complete.is_terminal());
        assert!(Stage::Error.is_terminal());
        assert!(!Stage::Init.is_terminal());
        assert!(!Stage::Enrich.is_terminal());
    }

    #[test]
    fn serde_snake_case() {
        assert_eq!(serde_json::to_string(&Stage::Validate).unwrap(), "\"validate\"");
        let parsed: Stage = serde_json::from_str("\"enrich\"").unwrap();
        assert_eq!(parsed, Stage::Enrich);
    }

    #[test]
    fn display_matches_as_str() {
        for stage in [
            Stage::Init,
            Stage::Validate,
            Stage::Enrich,
            Stage::Reason,
            Stage::Compile,
            Stage::Complete,
            Stage::Error,
        ] {
            assert_eq!(stage.to_string(), stage.as_str());
        }
    }
}
