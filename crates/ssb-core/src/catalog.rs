//! Status catalog.
//!
//! The single source of truth mapping `(topic, status code)` to a base
//! severity and message. Checks never pick a severity themselves; they pick a
//! status code and resolve it here. A missing entry is a defect and is
//! reported as [`CoreError::UnmappedStatus`].

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::{Alert, CheckId, MessagePart, Severity, StatusCode};

/// One alert-producing facet of a check. Multi-part checks own several topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertTopic {
    Contacts,
    RootUsage,
    RootMfa,
    RootAccessKey,
    UserMfa,
    PasswordPolicy,
    UserGroups,
    TrailLogging,
    TrailMultiRegion,
    AccountPublicAccess,
    BucketPublicAccess,
    Alarms,
    UnusedNetwork,
    TrustedAdvisor,
    GuardDuty,
}

impl AlertTopic {
    pub const ALL: [AlertTopic; 15] = [
        AlertTopic::Contacts,
        AlertTopic::RootUsage,
        AlertTopic::RootMfa,
        AlertTopic::RootAccessKey,
        AlertTopic::UserMfa,
        AlertTopic::PasswordPolicy,
        AlertTopic::UserGroups,
        AlertTopic::TrailLogging,
        AlertTopic::TrailMultiRegion,
        AlertTopic::AccountPublicAccess,
        AlertTopic::BucketPublicAccess,
        AlertTopic::Alarms,
        AlertTopic::UnusedNetwork,
        AlertTopic::TrustedAdvisor,
        AlertTopic::GuardDuty,
    ];

    /// The check this topic belongs to.
    pub fn check(self) -> CheckId {
        match self {
            AlertTopic::Contacts => CheckId::AccurateInformation,
            AlertTopic::RootUsage | AlertTopic::RootMfa | AlertTopic::RootAccessKey => {
                CheckId::ProtectRootUser
            }
            AlertTopic::UserMfa | AlertTopic::PasswordPolicy => CheckId::HumanIdentities,
            AlertTopic::UserGroups => CheckId::UserGroups,
            AlertTopic::TrailLogging | AlertTopic::TrailMultiRegion => CheckId::CloudTrail,
            AlertTopic::AccountPublicAccess | AlertTopic::BucketPublicAccess => {
                CheckId::PublicAccess
            }
            AlertTopic::Alarms => CheckId::Alarms,
            AlertTopic::UnusedNetwork => CheckId::UnusedNetwork,
            AlertTopic::TrustedAdvisor => CheckId::TrustedAdvisor,
            AlertTopic::GuardDuty => CheckId::GuardDuty,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AlertTopic::Contacts => "Alternate contacts",
            AlertTopic::RootUsage => "Root user activity",
            AlertTopic::RootMfa => "Root user MFA",
            AlertTopic::RootAccessKey => "Root user access keys",
            AlertTopic::UserMfa => "IAM user MFA",
            AlertTopic::PasswordPolicy => "Password policy",
            AlertTopic::UserGroups => "Directly attached user policies",
            AlertTopic::TrailLogging => "CloudTrail logging",
            AlertTopic::TrailMultiRegion => "CloudTrail multi-region",
            AlertTopic::AccountPublicAccess => "Account public access block",
            AlertTopic::BucketPublicAccess => "Bucket public access block",
            AlertTopic::Alarms => "CloudWatch alarms",
            AlertTopic::UnusedNetwork => "Unused network resources",
            AlertTopic::TrustedAdvisor => "Trusted Advisor",
            AlertTopic::GuardDuty => "GuardDuty",
        }
    }
}

#[derive(Debug)]
struct Part {
    text: &'static str,
    link: &'static str,
}

struct Entry {
    topic: AlertTopic,
    code: StatusCode,
    level: Severity,
    message: &'static [Part],
}

const CONTACTS_DOC: &str =
    "https://docs.aws.amazon.com/accounts/latest/reference/manage-acct-update-contact-alternate.html";
const ROOT_DOC: &str = "https://docs.aws.amazon.com/IAM/latest/UserGuide/root-user-best-practices.html";
const MFA_DOC: &str = "https://docs.aws.amazon.com/IAM/latest/UserGuide/id_credentials_mfa_enable.html";
const PASSWORD_DOC: &str =
    "https://docs.aws.amazon.com/IAM/latest/UserGuide/id_credentials_passwords_account-policy.html";
const GROUPS_DOC: &str = "https://docs.aws.amazon.com/IAM/latest/UserGuide/id_groups.html";
const TRAIL_DOC: &str =
    "https://docs.aws.amazon.com/awscloudtrail/latest/userguide/cloudtrail-create-and-update-a-trail.html";
const S3_BLOCK_DOC: &str =
    "https://docs.aws.amazon.com/AmazonS3/latest/userguide/access-control-block-public-access.html";
const ALARM_DOC: &str =
    "https://docs.aws.amazon.com/AmazonCloudWatch/latest/monitoring/AlarmThatSendsEmail.html";
const GLOBAL_VIEW: &str = "https://console.aws.amazon.com/ec2globalview/home";
const ADVISOR_DOC: &str =
    "https://docs.aws.amazon.com/awssupport/latest/user/trusted-advisor.html";
const GUARDDUTY_DOC: &str =
    "https://docs.aws.amazon.com/guardduty/latest/ug/guardduty_settingup.html";

const fn entry(
    topic: AlertTopic,
    code: StatusCode,
    level: Severity,
    message: &'static [Part],
) -> Entry {
    Entry {
        topic,
        code,
        level,
        message,
    }
}

use self::AlertTopic as T;
use crate::model::Severity as S;
use crate::model::StatusCode as C;

static ENTRIES: &[Entry] = &[
    // 01
    entry(T::Contacts, C::Info, S::Info, &[Part { text: "Register billing, security and operations contacts so the provider can reach the right people.", link: CONTACTS_DOC }]),
    entry(T::Contacts, C::Success, S::Success, &[Part { text: "All alternate contacts are registered.", link: "" }]),
    entry(T::Contacts, C::Warning, S::Warning, &[Part { text: "One or more alternate contacts are not registered.", link: CONTACTS_DOC }]),
    entry(T::Contacts, C::Error, S::Error, &[Part { text: "Alternate contacts could not be read.", link: "" }]),
    // 02
    entry(T::RootUsage, C::Success, S::Success, &[Part { text: "The root user has not been used in the last day.", link: "" }]),
    entry(T::RootUsage, C::Danger, S::Danger, &[Part { text: "The root user was used within the last day. Use IAM identities for daily work.", link: ROOT_DOC }]),
    entry(T::RootMfa, C::Success, S::Success, &[Part { text: "MFA is enabled for the root user.", link: "" }]),
    entry(T::RootMfa, C::Danger, S::Danger, &[Part { text: "MFA is not enabled for the root user.", link: MFA_DOC }]),
    entry(T::RootAccessKey, C::Success, S::Success, &[Part { text: "The root user has no active access keys.", link: "" }]),
    entry(T::RootAccessKey, C::Danger, S::Danger, &[Part { text: "The root user has active access keys. Delete them.", link: ROOT_DOC }]),
    entry(T::RootAccessKey, C::Error, S::Error, &[Part { text: "The credential report could not be read.", link: "" }]),
    // 03
    entry(T::UserMfa, C::Success, S::Success, &[Part { text: "Every IAM user has MFA enabled.", link: "" }]),
    entry(T::UserMfa, C::NoUser, S::Warning, &[Part { text: "No IAM users exist. Create individual users instead of sharing the root user.", link: ROOT_DOC }]),
    entry(T::UserMfa, C::Warning, S::Warning, &[Part { text: "Some IAM users do not have MFA enabled.", link: MFA_DOC }]),
    entry(T::PasswordPolicy, C::Success, S::Success, &[Part { text: "An account password policy is configured.", link: "" }]),
    entry(T::PasswordPolicy, C::Warning, S::Warning, &[Part { text: "No account password policy is configured.", link: PASSWORD_DOC }]),
    entry(T::PasswordPolicy, C::Error, S::Error, &[Part { text: "The password policy could not be read.", link: "" }]),
    // 04
    entry(T::UserGroups, C::Success, S::Success, &[Part { text: "No IAM user has policies attached directly.", link: "" }]),
    entry(T::UserGroups, C::NoUser, S::Warning, &[Part { text: "No IAM users exist.", link: "" }]),
    entry(T::UserGroups, C::Warning, S::Warning, &[Part { text: "Some IAM users have policies attached directly. Grant permissions through groups.", link: GROUPS_DOC }]),
    entry(T::UserGroups, C::Error, S::Error, &[Part { text: "IAM users could not be listed.", link: "" }]),
    // 05
    entry(T::TrailLogging, C::Success, S::Success, &[Part { text: "Every trail is logging.", link: "" }]),
    entry(T::TrailLogging, C::NoTrail, S::Danger, &[Part { text: "No CloudTrail trail exists.", link: TRAIL_DOC }]),
    entry(T::TrailLogging, C::AllOff, S::Danger, &[Part { text: "No trail is logging.", link: TRAIL_DOC }]),
    entry(T::TrailLogging, C::Warning, S::Warning, &[Part { text: "Some trails are not logging.", link: "" }]),
    entry(T::TrailLogging, C::Error, S::Error, &[Part { text: "Trails could not be inspected.", link: "" }]),
    entry(T::TrailMultiRegion, C::Success, S::Success, &[Part { text: "Every trail covers all regions.", link: "" }]),
    entry(T::TrailMultiRegion, C::NoTrail, S::Danger, &[Part { text: "No CloudTrail trail exists.", link: TRAIL_DOC }]),
    entry(T::TrailMultiRegion, C::NoMulti, S::Warning, &[Part { text: "No trail covers all regions.", link: TRAIL_DOC }]),
    entry(T::TrailMultiRegion, C::Warning, S::Warning, &[Part { text: "Some trails cover a single region only.", link: "" }]),
    // 06
    entry(T::AccountPublicAccess, C::Success, S::Success, &[Part { text: "Public access is blocked at the account level.", link: "" }]),
    entry(T::AccountPublicAccess, C::Warning, S::Warning, &[Part { text: "Public access is not fully blocked at the account level.", link: S3_BLOCK_DOC }]),
    entry(T::AccountPublicAccess, C::Error, S::Error, &[Part { text: "The account public access block could not be read.", link: "" }]),
    entry(T::BucketPublicAccess, C::Success, S::Success, &[Part { text: "Every bucket blocks public access.", link: "" }]),
    entry(T::BucketPublicAccess, C::Danger, S::Danger, &[Part { text: "Some buckets allow public access.", link: S3_BLOCK_DOC }]),
    entry(T::BucketPublicAccess, C::Error, S::Error, &[Part { text: "Buckets could not be listed.", link: "" }]),
    // 07
    entry(T::Alarms, C::Info, S::Info, &[Part { text: "Configure billing alarms and alarms on root user sign-in.", link: ALARM_DOC }]),
    entry(T::Alarms, C::Success, S::Success, &[Part { text: "CloudWatch alarms are configured.", link: "" }]),
    entry(T::Alarms, C::NoAlarm, S::Warning, &[Part { text: "No CloudWatch alarm is configured in any region.", link: ALARM_DOC }]),
    entry(T::Alarms, C::Error, S::Error, &[Part { text: "Regions could not be listed.", link: "" }]),
    // 08
    entry(T::UnusedNetwork, C::Warning, S::Warning, &[
        Part { text: "Unused resources cannot be judged automatically. Review VPCs and subnets without in-use interfaces.", link: "" },
        Part { text: "EC2 global view", link: GLOBAL_VIEW },
    ]),
    entry(T::UnusedNetwork, C::Error, S::Error, &[Part { text: "Regions could not be listed.", link: "" }]),
    // 09
    entry(T::TrustedAdvisor, C::Success, S::Success, &[Part { text: "Trusted Advisor is available.", link: "" }]),
    entry(T::TrustedAdvisor, C::Subscribe, S::Warning, &[Part { text: "Trusted Advisor status is only readable through the API on Business support plans or higher.", link: ADVISOR_DOC }]),
    entry(T::TrustedAdvisor, C::Warning, S::Warning, &[Part { text: "Trusted Advisor is not enabled.", link: ADVISOR_DOC }]),
    entry(T::TrustedAdvisor, C::Error, S::Error, &[Part { text: "Trusted Advisor status could not be read.", link: "" }]),
    // 10
    entry(T::GuardDuty, C::Success, S::Success, &[Part { text: "GuardDuty is enabled.", link: "" }]),
    entry(T::GuardDuty, C::Warning, S::Warning, &[Part { text: "GuardDuty is not enabled.", link: GUARDDUTY_DOC }]),
    entry(T::GuardDuty, C::Error, S::Error, &[Part { text: "GuardDuty status could not be read.", link: "" }]),
];

/// Resolved catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct AlertTemplate {
    pub topic: AlertTopic,
    pub code: StatusCode,
    pub level: Severity,
    message: &'static [Part],
}

impl AlertTemplate {
    pub fn to_alert(&self) -> Alert {
        Alert {
            title: self.topic.title().to_string(),
            level: self.level,
            code: self.code,
            message: self
                .message
                .iter()
                .map(|p| MessagePart::linked(p.text, p.link))
                .collect(),
        }
    }
}

/// Look up the severity and message for `code` under `topic`.
pub fn lookup(topic: AlertTopic, code: StatusCode) -> Result<AlertTemplate> {
    ENTRIES
        .iter()
        .find(|e| e.topic == topic && e.code == code)
        .map(|e| AlertTemplate {
            topic: e.topic,
            code: e.code,
            level: e.level,
            message: e.message,
        })
        .ok_or(CoreError::UnmappedStatus { topic, code })
}

/// Every status code the catalog knows for `topic`.
pub fn codes_for(topic: AlertTopic) -> Vec<StatusCode> {
    ENTRIES
        .iter()
        .filter(|e| e.topic == topic)
        .map(|e| e.code)
        .collect()
}
