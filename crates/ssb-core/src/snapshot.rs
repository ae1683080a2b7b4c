//! Recorded account state served through the provider gate.
//!
//! An `AccountSnapshot` is a JSON document describing everything the checks
//! read from one account. It implements [`CloudApi`], so audits can run
//! offline against a capture, and tests can script provider behaviour.
//!
//! Absent entries answer with the provider's own not-found codes. The
//! `failures` map injects an error for a whole operation
//! (`"list_buckets"`) or for one target (`"describe_alarms:eu-west-1"`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::api::{
    codes, AlternateContact, ApiError, ApiResult, CloudApi, ContactType, Detector, IamUser,
    MetricAlarm, NetworkInterface, PasswordPolicy, PublicAccessBlock, Subnet, Trail, TrailStatus,
    Vpc,
};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotUser {
    pub user_name: String,
    #[serde(default)]
    pub attached_policies: Vec<String>,
    #[serde(default)]
    pub inline_policies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTrail {
    pub arn: String,
    #[serde(default)]
    pub is_multi_region: bool,
    #[serde(default)]
    pub is_logging: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotBucket {
    pub name: String,
    #[serde(default)]
    pub public_access_block: Option<PublicAccessBlock>,
}

/// Per-region resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionState {
    pub alarms: Vec<MetricAlarm>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub vpcs: Vec<Vpc>,
    pub subnets: Vec<Subnet>,
    pub detectors: Vec<Detector>,
}

/// Whether the support plan exposes advisor checks through the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorAccess {
    #[default]
    Enabled,
    SubscriptionRequired,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub credential_report: Option<String>,
    pub alternate_contacts: BTreeMap<ContactType, AlternateContact>,
    pub password_policy: Option<PasswordPolicy>,
    pub users: Vec<SnapshotUser>,
    pub trails: Vec<SnapshotTrail>,
    pub account_public_access_block: Option<PublicAccessBlock>,
    pub buckets: Vec<SnapshotBucket>,
    pub regions: BTreeMap<String, RegionState>,
    pub trusted_advisor: AdvisorAccess,
    pub failures: BTreeMap<String, ApiError>,
}

impl AccountSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Make `operation` (optionally `operation:target`) fail with `error`.
    pub fn fail(mut self, key: impl Into<String>, error: ApiError) -> Self {
        self.failures.insert(key.into(), error);
        self
    }

    fn injected(&self, operation: &str, target: Option<&str>) -> ApiResult<()> {
        if let Some(target) = target {
            if let Some(err) = self.failures.get(&format!("{operation}:{target}")) {
                return Err(err.clone());
            }
        }
        match self.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn region(&self, region: &str) -> ApiResult<&RegionState> {
        self.regions.get(region).ok_or_else(|| {
            ApiError::new(
                "InvalidRegion",
                format!("The region '{region}' is not enabled for this account"),
            )
        })
    }

    fn user(&self, name: &str) -> ApiResult<&SnapshotUser> {
        self.users
            .iter()
            .find(|u| u.user_name == name)
            .ok_or_else(|| {
                ApiError::new(
                    codes::NO_SUCH_ENTITY,
                    format!("The user with name {name} cannot be found."),
                )
            })
    }
}

impl CloudApi for AccountSnapshot {
    fn generate_credential_report(&self) -> ApiResult<()> {
        self.injected("generate_credential_report", None)
    }

    fn get_credential_report(&self) -> ApiResult<String> {
        self.injected("get_credential_report", None)?;
        self.credential_report.clone().ok_or_else(|| {
            ApiError::new("ReportNotPresent", "Credential report has not been generated")
        })
    }

    fn get_alternate_contact(&self, kind: ContactType) -> ApiResult<AlternateContact> {
        self.injected("get_alternate_contact", Some(kind.as_str()))?;
        self.alternate_contacts.get(&kind).cloned().ok_or_else(|| {
            ApiError::new(
                codes::RESOURCE_NOT_FOUND,
                format!("No contact of type {} exists.", kind.as_str()),
            )
        })
    }

    fn get_account_password_policy(&self) -> ApiResult<PasswordPolicy> {
        self.injected("get_account_password_policy", None)?;
        self.password_policy.clone().ok_or_else(|| {
            ApiError::new(
                codes::NO_SUCH_ENTITY,
                "The Password Policy with domain name cannot be found.",
            )
        })
    }

    fn list_users(&self) -> ApiResult<Vec<IamUser>> {
        self.injected("list_users", None)?;
        Ok(self
            .users
            .iter()
            .map(|u| IamUser {
                user_name: u.user_name.clone(),
            })
            .collect())
    }

    fn list_attached_user_policies(&self, user: &str) -> ApiResult<Vec<String>> {
        self.injected("list_attached_user_policies", Some(user))?;
        Ok(self.user(user)?.attached_policies.clone())
    }

    fn list_user_policies(&self, user: &str) -> ApiResult<Vec<String>> {
        self.injected("list_user_policies", Some(user))?;
        Ok(self.user(user)?.inline_policies.clone())
    }

    fn describe_trails(&self) -> ApiResult<Vec<Trail>> {
        self.injected("describe_trails", None)?;
        Ok(self
            .trails
            .iter()
            .map(|t| Trail {
                arn: t.arn.clone(),
                is_multi_region: t.is_multi_region,
            })
            .collect())
    }

    fn get_trail_status(&self, trail_arn: &str) -> ApiResult<TrailStatus> {
        self.injected("get_trail_status", Some(trail_arn))?;
        self.trails
            .iter()
            .find(|t| t.arn == trail_arn)
            .map(|t| TrailStatus {
                is_logging: t.is_logging,
            })
            .ok_or_else(|| {
                ApiError::new(
                    "TrailNotFoundException",
                    format!("Unknown trail: {trail_arn}"),
                )
            })
    }

    fn get_caller_identity(&self) -> ApiResult<String> {
        self.injected("get_caller_identity", None)?;
        Ok(self.account_id.clone())
    }

    fn get_account_public_access_block(&self, account_id: &str) -> ApiResult<PublicAccessBlock> {
        self.injected("get_account_public_access_block", Some(account_id))?;
        self.account_public_access_block.ok_or_else(|| {
            ApiError::new(
                codes::NO_SUCH_PUBLIC_ACCESS_BLOCK,
                "The public access block configuration was not found",
            )
        })
    }

    fn list_buckets(&self) -> ApiResult<Vec<String>> {
        self.injected("list_buckets", None)?;
        Ok(self.buckets.iter().map(|b| b.name.clone()).collect())
    }

    fn get_bucket_public_access_block(&self, bucket: &str) -> ApiResult<PublicAccessBlock> {
        self.injected("get_bucket_public_access_block", Some(bucket))?;
        let entry = self
            .buckets
            .iter()
            .find(|b| b.name == bucket)
            .ok_or_else(|| {
                ApiError::new("NoSuchBucket", "The specified bucket does not exist")
            })?;
        entry.public_access_block.ok_or_else(|| {
            ApiError::new(
                codes::NO_SUCH_PUBLIC_ACCESS_BLOCK,
                "The public access block configuration was not found",
            )
        })
    }

    fn describe_regions(&self) -> ApiResult<Vec<String>> {
        self.injected("describe_regions", None)?;
        Ok(self.regions.keys().cloned().collect())
    }

    fn describe_alarms(&self, region: &str) -> ApiResult<Vec<MetricAlarm>> {
        self.injected("describe_alarms", Some(region))?;
        Ok(self.region(region)?.alarms.clone())
    }

    fn describe_network_interfaces(&self, region: &str) -> ApiResult<Vec<NetworkInterface>> {
        self.injected("describe_network_interfaces", Some(region))?;
        Ok(self.region(region)?.network_interfaces.clone())
    }

    fn describe_vpcs(&self, region: &str) -> ApiResult<Vec<Vpc>> {
        self.injected("describe_vpcs", Some(region))?;
        Ok(self.region(region)?.vpcs.clone())
    }

    fn describe_subnets(&self, region: &str) -> ApiResult<Vec<Subnet>> {
        self.injected("describe_subnets", Some(region))?;
        Ok(self.region(region)?.subnets.clone())
    }

    fn describe_trusted_advisor_checks(&self, region: &str) -> ApiResult<usize> {
        self.injected("describe_trusted_advisor_checks", Some(region))?;
        match self.trusted_advisor {
            AdvisorAccess::Enabled => Ok(1),
            AdvisorAccess::SubscriptionRequired => Err(ApiError::new(
                codes::SUBSCRIPTION_REQUIRED,
                "AWS Premium Support Subscription is required to use this service.",
            )),
        }
    }

    fn list_detectors(&self, region: &str) -> ApiResult<Vec<String>> {
        self.injected("list_detectors", Some(region))?;
        Ok(self
            .regions
            .get(region)
            .map(|r| r.detectors.iter().map(|d| d.detector_id.clone()).collect())
            .unwrap_or_default())
    }

    fn get_detector(&self, region: &str, detector_id: &str) -> ApiResult<Detector> {
        self.injected("get_detector", Some(detector_id))?;
        self.region(region)?
            .detectors
            .iter()
            .find(|d| d.detector_id == detector_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::new(
                    "BadRequestException",
                    format!("The request is rejected because the input detectorId is not owned by the current account: {detector_id}"),
                )
            })
    }
}
