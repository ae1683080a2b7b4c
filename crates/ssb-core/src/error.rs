//! Error taxonomy shared by the SSB crates.

use crate::catalog::AlertTopic;
use crate::model::StatusCode;

/// Errors raised while building or persisting audit records.
///
/// None of these are expected at runtime: an unmapped status or a row of the
/// wrong width is a defect in a check, and surfaces as an Error record.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unknown check id: {0} (expected 1..=10)")]
    UnknownCheck(String),

    #[error("no catalog entry for {topic:?} with status {code}")]
    UnmappedStatus { topic: AlertTopic, code: StatusCode },

    #[error("row has {actual} cells but the table declares {expected} columns")]
    RowArity { expected: usize, actual: usize },

    #[error("malformed credential report: {0}")]
    MalformedCredentialReport(String),

    #[error("report digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
