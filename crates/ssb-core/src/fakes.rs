//! Gate wrappers for tests.
//!
//! [`LatencyApi`] wraps any [`CloudApi`], sleeping before selected calls and
//! counting every call by operation name. Combined with
//! [`AccountSnapshot`](crate::snapshot::AccountSnapshot) it lets tests shuffle
//! completion order and assert on how the engine used the gate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{
    AlternateContact, ApiResult, CloudApi, ContactType, Detector, IamUser, MetricAlarm,
    NetworkInterface, PasswordPolicy, PublicAccessBlock, Subnet, Trail, TrailStatus, Vpc,
};

#[derive(Debug)]
pub struct LatencyApi<A> {
    inner: A,
    delays: HashMap<String, Duration>,
    calls: Mutex<HashMap<String, u64>>,
}

impl<A: CloudApi> LatencyApi<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            delays: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Sleep for `delay` before every call matching `key`.
    ///
    /// `key` is an operation name, or `operation:target` for one region,
    /// bucket, user or trail. A target-specific delay wins.
    pub fn with_delay(mut self, key: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(key.into(), delay);
        self
    }

    /// Number of calls made to `operation` so far.
    pub fn calls(&self, operation: &str) -> u64 {
        let calls = self.calls.lock().unwrap_or_else(|p| p.into_inner());
        calls.get(operation).copied().unwrap_or(0)
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn enter(&self, operation: &str, target: Option<&str>) {
        {
            let mut calls = self.calls.lock().unwrap_or_else(|p| p.into_inner());
            *calls.entry(operation.to_string()).or_insert(0) += 1;
        }
        let delay = target
            .and_then(|t| self.delays.get(&format!("{operation}:{t}")))
            .or_else(|| self.delays.get(operation));
        if let Some(delay) = delay {
            std::thread::sleep(*delay);
        }
    }
}

impl<A: CloudApi> CloudApi for LatencyApi<A> {
    fn generate_credential_report(&self) -> ApiResult<()> {
        self.enter("generate_credential_report", None);
        self.inner.generate_credential_report()
    }

    fn get_credential_report(&self) -> ApiResult<String> {
        self.enter("get_credential_report", None);
        self.inner.get_credential_report()
    }

    fn get_alternate_contact(&self, kind: ContactType) -> ApiResult<AlternateContact> {
        self.enter("get_alternate_contact", Some(kind.as_str()));
        self.inner.get_alternate_contact(kind)
    }

    fn get_account_password_policy(&self) -> ApiResult<PasswordPolicy> {
        self.enter("get_account_password_policy", None);
        self.inner.get_account_password_policy()
    }

    fn list_users(&self) -> ApiResult<Vec<IamUser>> {
        self.enter("list_users", None);
        self.inner.list_users()
    }

    fn list_attached_user_policies(&self, user: &str) -> ApiResult<Vec<String>> {
        self.enter("list_attached_user_policies", Some(user));
        self.inner.list_attached_user_policies(user)
    }

    fn list_user_policies(&self, user: &str) -> ApiResult<Vec<String>> {
        self.enter("list_user_policies", Some(user));
        self.inner.list_user_policies(user)
    }

    fn describe_trails(&self) -> ApiResult<Vec<Trail>> {
        self.enter("describe_trails", None);
        self.inner.describe_trails()
    }

    fn get_trail_status(&self, trail_arn: &str) -> ApiResult<TrailStatus> {
        self.enter("get_trail_status", Some(trail_arn));
        self.inner.get_trail_status(trail_arn)
    }

    fn get_caller_identity(&self) -> ApiResult<String> {
        self.enter("get_caller_identity", None);
        self.inner.get_caller_identity()
    }

    fn get_account_public_access_block(&self, account_id: &str) -> ApiResult<PublicAccessBlock> {
        self.enter("get_account_public_access_block", Some(account_id));
        self.inner.get_account_public_access_block(account_id)
    }

    fn list_buckets(&self) -> ApiResult<Vec<String>> {
        self.enter("list_buckets", None);
        self.inner.list_buckets()
    }

    fn get_bucket_public_access_block(&self, bucket: &str) -> ApiResult<PublicAccessBlock> {
        self.enter("get_bucket_public_access_block", Some(bucket));
        self.inner.get_bucket_public_access_block(bucket)
    }

    fn describe_regions(&self) -> ApiResult<Vec<String>> {
        self.enter("describe_regions", None);
        self.inner.describe_regions()
    }

    fn describe_alarms(&self, region: &str) -> ApiResult<Vec<MetricAlarm>> {
        self.enter("describe_alarms", Some(region));
        self.inner.describe_alarms(region)
    }

    fn describe_network_interfaces(&self, region: &str) -> ApiResult<Vec<NetworkInterface>> {
        self.enter("describe_network_interfaces", Some(region));
        self.inner.describe_network_interfaces(region)
    }

    fn describe_vpcs(&self, region: &str) -> ApiResult<Vec<Vpc>> {
        self.enter("describe_vpcs", Some(region));
        self.inner.describe_vpcs(region)
    }

    fn describe_subnets(&self, region: &str) -> ApiResult<Vec<Subnet>> {
        self.enter("describe_subnets", Some(region));
        self.inner.describe_subnets(region)
    }

    fn describe_trusted_advisor_checks(&self, region: &str) -> ApiResult<usize> {
        self.enter("describe_trusted_advisor_checks", Some(region));
        self.inner.describe_trusted_advisor_checks(region)
    }

    fn list_detectors(&self, region: &str) -> ApiResult<Vec<String>> {
        self.enter("list_detectors", Some(region));
        self.inner.list_detectors(region)
    }

    fn get_detector(&self, region: &str, detector_id: &str) -> ApiResult<Detector> {
        self.enter("get_detector", Some(detector_id));
        self.inner.get_detector(region, detector_id)
    }
}
