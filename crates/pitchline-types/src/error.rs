//! Error types for the pitchline pipeline.
//!
//! [`PitchlineError`] is the top-level error type surfaced by the
//! orchestrator. Under normal operation the pipeline never surfaces an
//! error to its caller -- failures are recorded into the context's
//! `errors`/`warnings`/`stage` fields -- so these variants cover the
//! catastrophic and serialization paths only.

use thiserror::Error;

/// Top-level error type for the pitchline pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PitchlineError {
    /// A stage failed in a way the plugin manager's isolation did not
    /// cover. Halts the pipeline.
    #[error("stage '{stage}' failed: {reason}")]
    StageFailed {
        /// The stage that failed.
        stage: String,
        /// What went wrong.
        reason: String,
    },

    /// The pipeline run was cancelled via its cancellation token.
    #[error("pipeline cancelled")]
    Cancelled,

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenience alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PitchlineError>;
