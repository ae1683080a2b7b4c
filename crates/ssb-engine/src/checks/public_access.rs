//! 06: S3 public access is blocked for the account and its buckets.

use ssb_core::{codes, AlertTopic, Cell, CheckId, CheckReport, StatusCode, Table};

use super::{alert, CheckContext};
use crate::error::Result;
use crate::fanout::fan_out;

const BLOCKED: &str = "blocked";
const PARTIAL: &str = "partially allowed";

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let mut table = Table::new(&["Name", "Public access"]);
    let mut alerts = Vec::new();

    let account = ctx
        .api
        .get_caller_identity()
        .and_then(|id| ctx.api.get_account_public_access_block(&id));
    let account_code = match account {
        Ok(block) if block.blocks_all() => StatusCode::Success,
        Ok(_) => StatusCode::Warning,
        // No account-level configuration means nothing is blocked there.
        Err(e) if e.is(codes::NO_SUCH_PUBLIC_ACCESS_BLOCK) => StatusCode::Warning,
        Err(e) => {
            alerts.push(alert(AlertTopic::AccountPublicAccess, StatusCode::Error)?.with_detail(e.message));
            return Ok(CheckReport::new(CheckId::PublicAccess, alerts, vec![table]));
        }
    };
    let account_open = account_code == StatusCode::Warning;
    table.push_row(vec![
        "Account setting".into(),
        Cell::from(if account_open { PARTIAL } else { BLOCKED }),
    ])?;
    alerts.push(alert(AlertTopic::AccountPublicAccess, account_code)?);

    let buckets = match ctx.api.list_buckets() {
        Ok(b) => b,
        Err(e) => {
            alerts.push(alert(AlertTopic::BucketPublicAccess, StatusCode::Error)?.with_detail(e.message));
            return Ok(CheckReport::new(CheckId::PublicAccess, alerts, vec![table]));
        }
    };

    let results = fan_out(ctx, "get_bucket_public_access_block", buckets, |api, bucket| {
        api.get_bucket_public_access_block(bucket)
    });

    let mut bucket_code = StatusCode::Success;
    for candidate in results {
        // A bucket whose configuration cannot be read counts as blocked.
        let blocked = candidate.outcome.map(|b| b.blocks_all()).unwrap_or(true);
        if !blocked {
            bucket_code = StatusCode::Danger;
        }
        table.push_row(vec![
            candidate.key.into(),
            Cell::from(if blocked { BLOCKED } else { PARTIAL }),
        ])?;
    }

    // Bucket settings only matter while the account-level block is incomplete.
    if account_open {
        alerts.push(alert(AlertTopic::BucketPublicAccess, bucket_code)?);
    }

    Ok(CheckReport::new(CheckId::PublicAccess, alerts, vec![table]))
}
