//! Error types for plate-eval operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for plate-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or running an evaluation.
///
/// Only precondition failures live here. Failures of a single recognition
/// request are values (see [`crate::engine::Recognition`]), never errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The recognition engine could not be started or failed its handshake.
    #[error("Engine startup failed: {0}")]
    EngineStartup(String),

    /// An annotation file could not be parsed.
    #[error("Annotation parse failed: {path}: {reason}")]
    Annotation {
        /// Path to the annotation file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// The ground-truth map is empty, so there is nothing to evaluate against.
    #[error("No ground truth loaded")]
    NoGroundTruth,

    /// Error while listing candidate images.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Error writing report files.
    #[error("Report error: {0}")]
    Report(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
