//! 09: Trusted Advisor is reachable.

use ssb_core::{codes, AlertTopic, CheckId, CheckReport, StatusCode, Table};

use super::{alert, CheckContext};
use crate::error::Result;

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let mut table = Table::new(&["Trusted Advisor status"]);

    let status = match ctx.api.describe_trusted_advisor_checks(&ctx.support_region) {
        Ok(_) => {
            table.push_row(vec!["enabled".into()])?;
            alert(AlertTopic::TrustedAdvisor, StatusCode::Success)?
        }
        Err(e) if e.is(codes::SUBSCRIPTION_REQUIRED) => {
            alert(AlertTopic::TrustedAdvisor, StatusCode::Subscribe)?
        }
        Err(e) => alert(AlertTopic::TrustedAdvisor, StatusCode::Error)?.with_detail(e.message),
    };

    Ok(CheckReport::new(CheckId::TrustedAdvisor, vec![status], vec![table]))
}
