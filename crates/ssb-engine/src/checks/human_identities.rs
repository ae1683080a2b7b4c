//! 03: IAM users exist, use MFA, and a password policy is set.

use ssb_core::{codes, AlertTopic, CheckId, CheckReport, StatusCode, Table};

use super::credential_report::CredentialReport;
use super::{alert, CheckContext};
use crate::error::Result;

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let mut table = Table::new(&["IAM user", "MFA", "Access key 1", "Access key 2"]);
    let mut alerts = Vec::new();

    let csv = match ctx.api.get_credential_report() {
        Ok(csv) => csv,
        Err(e) => {
            alerts.push(alert(AlertTopic::PasswordPolicy, StatusCode::Error)?.with_detail(e.message));
            return Ok(CheckReport::new(CheckId::HumanIdentities, alerts, vec![table]));
        }
    };
    let report = CredentialReport::parse(&csv)?;

    let mut mfa_code = if report.users.is_empty() {
        StatusCode::NoUser
    } else {
        StatusCode::Success
    };
    for user in &report.users {
        table.push_row(vec![
            user.user().into(),
            user.mfa_active().into(),
            user.access_key_1_active().into(),
            user.access_key_2_active().into(),
        ])?;
        if !user.has_mfa() {
            mfa_code = StatusCode::Warning;
        }
    }
    alerts.push(alert(AlertTopic::UserMfa, mfa_code)?);

    let policy = match ctx.api.get_account_password_policy() {
        Ok(_) => alert(AlertTopic::PasswordPolicy, StatusCode::Success)?,
        Err(e) if e.is(codes::NO_SUCH_ENTITY) => {
            alert(AlertTopic::PasswordPolicy, StatusCode::Warning)?
        }
        Err(e) => alert(AlertTopic::PasswordPolicy, StatusCode::Error)?.with_detail(e.message),
    };
    alerts.push(policy);

    Ok(CheckReport::new(CheckId::HumanIdentities, alerts, vec![table]))
}
