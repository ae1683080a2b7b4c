//! Error types for the audit engine.

use std::time::Duration;

use ssb_core::{ApiError, CheckId, CoreError};

/// Failures of the bounded work pool itself, as opposed to the operations it runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool {pool} is closed")]
    Closed { pool: String },

    #[error("operation {label} panicked: {message}")]
    Panicked { label: String, message: String },

    #[error("operation {label} was cancelled")]
    Cancelled { label: String },

    #[error("operation {label} did not finish within {limit:?}")]
    TimedOut { label: String, limit: Duration },

    #[error("no tokio runtime is available to host the pool")]
    NoRuntime,
}

/// Everything that can escape a check unit.
///
/// The engine never returns these from `run`; each one is turned into a
/// synthetic Error record for the affected check.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("provider error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("{check} did not finish within {limit:?}")]
    TimedOut { check: CheckId, limit: Duration },

    #[error("no check unit registered for {0}")]
    Unregistered(CheckId),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, AuditError>;
