use std::path::PathBuf;

use thiserror::Error;

/// Run-level analysis failures.
///
/// Only these propagate out of a pipeline run. Per-frame decode
/// failures, degenerate detections, and per-face classification
/// failures degrade into the [`Verdict`](crate::pipeline::verdict::Verdict)
/// instead of aborting the run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("cannot open media source {path}: {message}")]
    MediaAccess { path: PathBuf, message: String },

    #[error("analysis cancelled")]
    Cancelled,

    #[error("pipeline thread panicked: {0}")]
    Thread(String),

    #[error("pipeline already executed")]
    AlreadyExecuted,
}
