//! 04: permissions are granted through groups, not attached to users.

use ssb_core::{AlertTopic, ApiResult, CheckId, CheckReport, StatusCode, Table};

use super::{alert, CheckContext};
use crate::error::Result;

fn scan(ctx: &CheckContext, table: &mut Table) -> Result<ApiResult<StatusCode>> {
    let users = match ctx.api.list_users() {
        Ok(users) => users,
        Err(e) => return Ok(Err(e)),
    };
    if users.is_empty() {
        return Ok(Ok(StatusCode::NoUser));
    }

    let mut code = StatusCode::Success;
    for user in users {
        let attached = match ctx.api.list_attached_user_policies(&user.user_name) {
            Ok(p) => p,
            Err(e) => return Ok(Err(e)),
        };
        let inline = match ctx.api.list_user_policies(&user.user_name) {
            Ok(p) => p,
            Err(e) => return Ok(Err(e)),
        };
        table.push_row(vec![
            user.user_name.into(),
            attached.len().into(),
            inline.len().into(),
        ])?;
        if !attached.is_empty() || !inline.is_empty() {
            code = StatusCode::Warning;
        }
    }
    Ok(Ok(code))
}

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let mut table = Table::new(&["IAM user", "Attached policies", "Inline policies"]);

    let status = match scan(ctx, &mut table)? {
        Ok(code) => alert(AlertTopic::UserGroups, code)?,
        Err(e) => alert(AlertTopic::UserGroups, StatusCode::Error)?.with_detail(e.message),
    };

    Ok(CheckReport::new(CheckId::UserGroups, vec![status], vec![table]))
}
