//! Credential report parsing.
//!
//! The report is CSV: a header row, the root account, then one row per IAM
//! user. Only the columns the checks read are exposed.

use chrono::{DateTime, Duration, Utc};

use ssb_core::CoreError;

const USER: usize = 0;
const PASSWORD_LAST_USED: usize = 4;
const MFA_ACTIVE: usize = 7;
const ACCESS_KEY_1_ACTIVE: usize = 8;
const ACCESS_KEY_1_LAST_USED: usize = 10;
const ACCESS_KEY_2_ACTIVE: usize = 13;
const ACCESS_KEY_2_LAST_USED: usize = 15;
const MIN_FIELDS: usize = ACCESS_KEY_2_LAST_USED + 1;

/// Age assigned to credentials that were never used.
pub const NEVER_USED_DAYS: i64 = 9999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRow {
    fields: Vec<String>,
}

impl CredentialRow {
    fn parse(line: &str, index: usize) -> Result<Self, CoreError> {
        let fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
        if fields.len() < MIN_FIELDS {
            return Err(CoreError::MalformedCredentialReport(format!(
                "row {index} has {} fields, expected at least {MIN_FIELDS}",
                fields.len()
            )));
        }
        Ok(Self { fields })
    }

    fn field(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn user(&self) -> &str {
        self.field(USER)
    }

    pub fn mfa_active(&self) -> &str {
        self.field(MFA_ACTIVE)
    }

    pub fn access_key_1_active(&self) -> &str {
        self.field(ACCESS_KEY_1_ACTIVE)
    }

    pub fn access_key_2_active(&self) -> &str {
        self.field(ACCESS_KEY_2_ACTIVE)
    }

    pub fn has_mfa(&self) -> bool {
        self.mfa_active() == "true"
    }

    /// Both access keys are reported inactive.
    pub fn keys_inactive(&self) -> bool {
        self.access_key_1_active() == "false" && self.access_key_2_active() == "false"
    }

    /// Time since the most recent use of the password or either access key.
    pub fn last_used(&self, now: DateTime<Utc>) -> Result<Duration, CoreError> {
        let ages = [
            age(self.field(PASSWORD_LAST_USED), now)?,
            age(self.field(ACCESS_KEY_1_LAST_USED), now)?,
            age(self.field(ACCESS_KEY_2_LAST_USED), now)?,
        ];
        Ok(ages.into_iter().min().unwrap_or_else(|| Duration::days(NEVER_USED_DAYS)))
    }
}

fn age(value: &str, now: DateTime<Utc>) -> Result<Duration, CoreError> {
    match value {
        "N/A" | "no_information" | "not_supported" => Ok(Duration::days(NEVER_USED_DAYS)),
        stamp => DateTime::parse_from_rfc3339(stamp)
            .map(|t| now - t.with_timezone(&Utc))
            .map_err(|e| {
                CoreError::MalformedCredentialReport(format!("bad timestamp {stamp:?}: {e}"))
            }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialReport {
    pub root: CredentialRow,
    pub users: Vec<CredentialRow>,
}

impl CredentialReport {
    pub fn parse(csv: &str) -> Result<Self, CoreError> {
        let mut rows = csv.lines().map(str::trim).filter(|l| !l.is_empty());

        rows.next()
            .ok_or_else(|| CoreError::MalformedCredentialReport("empty report".into()))?;
        let root = rows
            .next()
            .ok_or_else(|| CoreError::MalformedCredentialReport("missing root row".into()))
            .and_then(|line| CredentialRow::parse(line, 1))?;
        let users = rows
            .enumerate()
            .map(|(i, line)| CredentialRow::parse(line, i + 2))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { root, users })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_root_and_users() {
        let csv = report(&[
            quiet_root(),
            row("alice", "N/A", true, true, "N/A", false, "N/A"),
            row("bob", "N/A", false, false, "N/A", false, "N/A"),
        ]);
        let parsed = CredentialReport::parse(&csv).unwrap();
        assert_eq!(parsed.root.user(), "<root_account>");
        assert!(parsed.root.has_mfa());
        assert!(parsed.root.keys_inactive());
        assert_eq!(parsed.users.len(), 2);
        assert_eq!(parsed.users[1].user(), "bob");
        assert!(!parsed.users[1].has_mfa());
    }

    #[test]
    fn test_last_used_takes_most_recent() {
        let r = row(
            "<root_account>",
            "2024-05-01T00:00:00+00:00",
            true,
            true,
            "2024-05-31T12:00:00+00:00",
            false,
            "N/A",
        );
        let parsed = CredentialReport::parse(&report(&[r])).unwrap();
        let age = parsed.root.last_used(now()).unwrap();
        assert_eq!(age, Duration::hours(12));
    }

    #[test]
    fn test_never_used_is_ancient() {
        let r = row("<root_account>", "no_information", false, false, "N/A", false, "N/A");
        let parsed = CredentialReport::parse(&report(&[r])).unwrap();
        assert_eq!(
            parsed.root.last_used(now()).unwrap().num_days(),
            NEVER_USED_DAYS
        );
    }

    #[test]
    fn test_malformed_reports_rejected() {
        assert!(CredentialReport::parse("").is_err());
        assert!(CredentialReport::parse(HEADER).is_err());
        assert!(CredentialReport::parse(&format!("{HEADER}\nroot,only,three")).is_err());

        let bad_stamp = row("<root_account>", "yesterday", true, false, "N/A", false, "N/A");
        let parsed = CredentialReport::parse(&report(&[bad_stamp])).unwrap();
        assert!(matches!(
            parsed.root.last_used(now()),
            Err(CoreError::MalformedCredentialReport(_))
        ));
    }
}
