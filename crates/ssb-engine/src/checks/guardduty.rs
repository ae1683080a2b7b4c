//! 10: GuardDuty is enabled in the home region.

use ssb_core::{AlertTopic, ApiResult, CheckId, CheckReport, StatusCode, Table};

use super::{alert, CheckContext};
use crate::error::Result;

fn status(ctx: &CheckContext) -> ApiResult<StatusCode> {
    let region = ctx.home_region.as_str();
    let detectors = ctx.api.list_detectors(region)?;
    if detectors.is_empty() {
        return Ok(StatusCode::Warning);
    }
    let mut code = StatusCode::Success;
    for id in &detectors {
        if !ctx.api.get_detector(region, id)?.is_enabled() {
            code = StatusCode::Warning;
        }
    }
    Ok(code)
}

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let finding = match status(ctx) {
        Ok(code) => alert(AlertTopic::GuardDuty, code)?,
        Err(e) => alert(AlertTopic::GuardDuty, StatusCode::Error)?.with_detail(e.message),
    };
    Ok(CheckReport::new(CheckId::GuardDuty, vec![finding], vec![Table::headless()]))
}
