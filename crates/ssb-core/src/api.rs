//! Provider gate.
//!
//! `CloudApi` is the only way checks touch the provider. Every method is a
//! synchronous, blocking request/response call; callers are expected to run
//! it on a worker thread. Errors carry the provider's own error code so
//! checks can tell expected absences (not-found) from real failures.

use serde::{Deserialize, Serialize};

/// Provider error codes that checks treat as data rather than failure.
pub mod codes {
    pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
    pub const NO_SUCH_ENTITY: &str = "NoSuchEntity";
    pub const NO_SUCH_PUBLIC_ACCESS_BLOCK: &str = "NoSuchPublicAccessBlockConfiguration";
    pub const SUBSCRIPTION_REQUIRED: &str = "SubscriptionRequiredException";
}

/// Provider error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether this error carries the given provider code.
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

/// Result type for provider calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    Billing,
    Security,
    Operations,
}

impl ContactType {
    pub const ALL: [ContactType; 3] = [
        ContactType::Billing,
        ContactType::Security,
        ContactType::Operations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContactType::Billing => "BILLING",
            ContactType::Security => "SECURITY",
            ContactType::Operations => "OPERATIONS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateContact {
    pub name: String,
    pub email_address: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    #[serde(default)]
    pub minimum_password_length: u32,
    #[serde(default)]
    pub require_symbols: bool,
    #[serde(default)]
    pub require_numbers: bool,
    #[serde(default)]
    pub max_password_age: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamUser {
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trail {
    pub arn: String,
    pub is_multi_region: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailStatus {
    pub is_logging: bool,
}

/// The four public-access-block flags, at account or bucket scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAccessBlock {
    pub block_public_acls: bool,
    pub ignore_public_acls: bool,
    pub block_public_policy: bool,
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlock {
    pub fn all_blocked() -> Self {
        Self {
            block_public_acls: true,
            ignore_public_acls: true,
            block_public_policy: true,
            restrict_public_buckets: true,
        }
    }

    /// True only when every flag is set.
    pub fn blocks_all(&self) -> bool {
        self.block_public_acls
            && self.ignore_public_acls
            && self.block_public_policy
            && self.restrict_public_buckets
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricAlarm {
    pub alarm_arn: String,
}

impl MetricAlarm {
    // arn:aws:cloudwatch:<region>:<account>:alarm:<name>
    fn arn_field(&self, idx: usize) -> Option<&str> {
        self.alarm_arn.split(':').nth(idx).filter(|s| !s.is_empty())
    }

    pub fn region(&self) -> Option<&str> {
        self.arn_field(3)
    }

    pub fn name(&self) -> Option<&str> {
        self.arn_field(6)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub status: String,
    pub vpc_id: String,
    pub subnet_id: String,
}

impl NetworkInterface {
    pub fn in_use(&self) -> bool {
        self.status == "in-use"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub vpc_id: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub subnet_id: String,
    #[serde(default)]
    pub default_for_az: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detector {
    pub detector_id: String,
    pub status: String,
}

impl Detector {
    pub fn is_enabled(&self) -> bool {
        self.status == "ENABLED"
    }
}

// ---------------------------------------------------------------------------
// Gate trait
// ---------------------------------------------------------------------------

/// Blocking, read-only provider operations used by the baseline checks.
///
/// Implementations must tolerate unlimited concurrent callers; rate limiting
/// and backoff belong to the implementation, not to the engine.
pub trait CloudApi: Send + Sync {
    /// Ask the provider to (re)build the account credential report.
    fn generate_credential_report(&self) -> ApiResult<()>;

    /// Credential report as CSV text, header row first, root account second.
    fn get_credential_report(&self) -> ApiResult<String>;

    fn get_alternate_contact(&self, kind: ContactType) -> ApiResult<AlternateContact>;

    fn get_account_password_policy(&self) -> ApiResult<PasswordPolicy>;

    fn list_users(&self) -> ApiResult<Vec<IamUser>>;

    /// Names of managed policies attached directly to `user`.
    fn list_attached_user_policies(&self, user: &str) -> ApiResult<Vec<String>>;

    /// Names of inline policies embedded in `user`.
    fn list_user_policies(&self, user: &str) -> ApiResult<Vec<String>>;

    fn describe_trails(&self) -> ApiResult<Vec<Trail>>;

    fn get_trail_status(&self, trail_arn: &str) -> ApiResult<TrailStatus>;

    /// Account id of the calling identity.
    fn get_caller_identity(&self) -> ApiResult<String>;

    fn get_account_public_access_block(&self, account_id: &str) -> ApiResult<PublicAccessBlock>;

    fn list_buckets(&self) -> ApiResult<Vec<String>>;

    fn get_bucket_public_access_block(&self, bucket: &str) -> ApiResult<PublicAccessBlock>;

    fn describe_regions(&self) -> ApiResult<Vec<String>>;

    fn describe_alarms(&self, region: &str) -> ApiResult<Vec<MetricAlarm>>;

    fn describe_network_interfaces(&self, region: &str) -> ApiResult<Vec<NetworkInterface>>;

    fn describe_vpcs(&self, region: &str) -> ApiResult<Vec<Vpc>>;

    fn describe_subnets(&self, region: &str) -> ApiResult<Vec<Subnet>>;

    /// Succeeds when advisor checks are readable; the result is the number of checks.
    fn describe_trusted_advisor_checks(&self, region: &str) -> ApiResult<usize>;

    fn list_detectors(&self, region: &str) -> ApiResult<Vec<String>>;

    fn get_detector(&self, region: &str, detector_id: &str) -> ApiResult<Detector>;
}
