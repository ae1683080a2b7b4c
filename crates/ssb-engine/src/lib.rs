//! SSB Engine
//!
//! Runs the baseline check units concurrently against a [`ssb_core::CloudApi`]
//! and aggregates their records into one title-ordered result list.
//!
//! Two levels of concurrency are used: an outer pool that runs whole check
//! units, and a per-unit inner pool for fan-out over buckets or regions.
//! Both pools sit on tokio's blocking threads so the synchronous provider
//! gate never stalls the async scheduler.

pub mod checks;
pub mod config;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod metrics;
pub mod obs;
pub mod pool;

pub use checks::{CheckContext, CheckDescriptor, CheckKind, CheckRegistry};
pub use config::EngineConfig;
pub use engine::{AuditEngine, AuditRun};
pub use error::{AuditError, PoolError, Result};
pub use fanout::{fan_out, Candidate, CandidateError};
pub use metrics::METRICS;
pub use pool::{PoolTask, WorkPool};
