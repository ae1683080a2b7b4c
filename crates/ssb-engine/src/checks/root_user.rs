//! 02: the root user is idle, has MFA and no access keys.

use chrono::Duration;

use ssb_core::{AlertTopic, CheckId, CheckReport, StatusCode, Table};

use super::credential_report::CredentialReport;
use super::{alert, CheckContext};
use crate::error::Result;

fn pick(ok: bool) -> StatusCode {
    if ok {
        StatusCode::Success
    } else {
        StatusCode::Danger
    }
}

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let mut table = Table::new(&["Last used", "MFA", "Access key 1", "Access key 2"]);

    let csv = match ctx.api.get_credential_report() {
        Ok(csv) => csv,
        Err(e) => {
            let alerts =
                vec![alert(AlertTopic::RootAccessKey, StatusCode::Error)?.with_detail(e.message)];
            return Ok(CheckReport::new(CheckId::ProtectRootUser, alerts, vec![table]));
        }
    };

    let report = CredentialReport::parse(&csv)?;
    let root = &report.root;
    let last_used = root.last_used(ctx.now)?;

    let alerts = vec![
        alert(AlertTopic::RootUsage, pick(last_used > Duration::days(1)))?,
        alert(AlertTopic::RootMfa, pick(root.has_mfa()))?,
        alert(AlertTopic::RootAccessKey, pick(root.keys_inactive()))?,
    ];
    table.push_row(vec![
        format!("{} days ago", last_used.num_days()).into(),
        root.mfa_active().into(),
        root.access_key_1_active().into(),
        root.access_key_2_active().into(),
    ])?;

    Ok(CheckReport::new(CheckId::ProtectRootUser, alerts, vec![table]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::credential_report::fixtures::{quiet_root, report, row};
    use crate::checks::testing;
    use crate::error::AuditError;
    use ssb_core::{AccountSnapshot, ApiError, Severity};

    fn with_report(csv: String) -> AccountSnapshot {
        AccountSnapshot {
            credential_report: Some(csv),
            ..AccountSnapshot::default()
        }
    }

    #[test]
    fn test_quiet_root_is_all_success() {
        let out = testing::run(run, with_report(report(&[quiet_root()]))).unwrap();
        let levels: Vec<Severity> = out.alerts().iter().map(|a| a.level).collect();
        assert_eq!(levels, vec![Severity::Success; 3]);
        assert_eq!(out.tables()[0].rows[0][0].to_string(), "517 days ago");
    }

    #[test]
    fn test_recent_use_without_mfa_is_danger() {
        let root = row(
            "<root_account>",
            "2024-05-31T18:00:00+00:00",
            false,
            true,
            "N/A",
            false,
            "N/A",
        );
        let out = testing::run(run, with_report(report(&[root]))).unwrap();
        let levels: Vec<Severity> = out.alerts().iter().map(|a| a.level).collect();
        assert_eq!(levels, vec![Severity::Danger; 3]);
        assert_eq!(out.tables()[0].rows[0][0].to_string(), "0 days ago");
    }

    #[test]
    fn test_report_failure_is_single_error_alert() {
        let snapshot = AccountSnapshot::default().fail(
            "get_credential_report",
            ApiError::new("ServiceFailure", "report unavailable"),
        );
        let out = testing::run(run, snapshot).unwrap();
        assert_eq!(out.alerts().len(), 1);
        assert_eq!(out.alerts()[0].level, Severity::Error);
        assert!(testing::texts(&out.alerts()[0]).contains(&"report unavailable"));
        assert_eq!(out.row_count(), 0);
    }

    #[test]
    fn test_malformed_report_escapes() {
        let err = testing::run(run, with_report("user,arn\n".into())).unwrap_err();
        assert!(matches!(err, AuditError::Core(_)));
    }
}
