//! SSB Core Library
//!
//! Shared building blocks for the security-baseline audit:
//! - the Result Record model (`CheckReport`, `Alert`, `Table`, `Severity`)
//! - the status catalog mapping `(topic, status code)` to severity and text
//! - the synchronous provider gate (`CloudApi`) and its error payload
//! - an offline gate backed by a recorded account snapshot
//! - report artifacts and tracing initialisation

pub mod api;
pub mod catalog;
pub mod error;
pub mod fakes;
pub mod model;
pub mod report;
pub mod snapshot;
pub mod telemetry;

pub use api::{
    codes, AlternateContact, ApiError, ApiResult, CloudApi, ContactType, Detector, IamUser,
    MetricAlarm, NetworkInterface, PasswordPolicy, PublicAccessBlock, Subnet, Trail, TrailStatus,
    Vpc,
};
pub use catalog::{lookup, AlertTemplate, AlertTopic};
pub use error::{CoreError, Result};
pub use model::{Alert, Cell, CheckId, CheckReport, MessagePart, Severity, StatusCode, Table};
pub use report::{results_digest, AuditReport, SeveritySummary};
pub use fakes::LatencyApi;
pub use snapshot::{
    AccountSnapshot, AdvisorAccess, RegionState, SnapshotBucket, SnapshotTrail, SnapshotUser,
};
pub use telemetry::init_tracing;

/// SSB version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
