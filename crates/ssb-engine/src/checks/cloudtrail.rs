//! 05: CloudTrail trails exist, are logging, and cover every region.

use ssb_core::{AlertTopic, ApiError, CheckId, CheckReport, StatusCode, Table};

use super::{alert, CheckContext};
use crate::error::Result;

struct Tally {
    logging: StatusCode,
    multi_region: StatusCode,
}

fn scan(ctx: &CheckContext, table: &mut Table) -> Result<std::result::Result<Tally, ApiError>> {
    let trails = match ctx.api.describe_trails() {
        Ok(t) => t,
        Err(e) => return Ok(Err(e)),
    };
    if trails.is_empty() {
        return Ok(Ok(Tally {
            logging: StatusCode::NoTrail,
            multi_region: StatusCode::NoTrail,
        }));
    }

    let mut tally = Tally {
        logging: StatusCode::Success,
        multi_region: StatusCode::Success,
    };
    let (mut logging, mut multi) = (0usize, 0usize);

    for trail in &trails {
        let status = match ctx.api.get_trail_status(&trail.arn) {
            Ok(s) => s,
            Err(e) => return Ok(Err(e)),
        };
        if status.is_logging {
            logging += 1;
        } else {
            tally.logging = StatusCode::Warning;
        }
        if trail.is_multi_region {
            multi += 1;
        } else {
            tally.multi_region = StatusCode::Warning;
        }
        table.push_row(vec![
            trail.arn.as_str().into(),
            trail.is_multi_region.into(),
            status.is_logging.into(),
        ])?;
    }

    if logging == 0 {
        tally.logging = StatusCode::AllOff;
    }
    if multi == 0 {
        tally.multi_region = StatusCode::NoMulti;
    }
    Ok(Ok(tally))
}

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let mut table = Table::new(&["Trail", "Multi region", "Logging"]);

    let alerts = match scan(ctx, &mut table)? {
        Ok(tally) => vec![
            alert(AlertTopic::TrailLogging, tally.logging)?,
            alert(AlertTopic::TrailMultiRegion, tally.multi_region)?,
        ],
        // The multi-region status means nothing when the trails could not be read.
        Err(e) => vec![alert(AlertTopic::TrailLogging, StatusCode::Error)?.with_detail(e.message)],
    };

    Ok(CheckReport::new(CheckId::CloudTrail, alerts, vec![table]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing;
    use ssb_core::snapshot::SnapshotTrail;
    use ssb_core::{AccountSnapshot, Severity};

    fn trail(name: &str, multi: bool, logging: bool) -> SnapshotTrail {
        SnapshotTrail {
            arn: format!("arn:aws:cloudtrail:us-east-1:123456789012:trail/{name}"),
            is_multi_region: multi,
            is_logging: logging,
        }
    }

    fn codes(report: &CheckReport) -> Vec<StatusCode> {
        report.alerts().iter().map(|a| a.code).collect()
    }

    #[test]
    fn test_no_trails() {
        let out = testing::run(run, AccountSnapshot::default()).unwrap();
        assert_eq!(codes(&out), vec![StatusCode::NoTrail, StatusCode::NoTrail]);
        assert!(out.tables()[0].is_empty());
    }

    #[test]
    fn test_all_good() {
        let snapshot = AccountSnapshot {
            trails: vec![trail("main", true, true)],
            ..AccountSnapshot::default()
        };
        let out = testing::run(run, snapshot).unwrap();
        assert_eq!(codes(&out), vec![StatusCode::Success, StatusCode::Success]);
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn test_all_off_and_single_region() {
        let snapshot = AccountSnapshot {
            trails: vec![trail("a", false, false), trail("b", false, false)],
            ..AccountSnapshot::default()
        };
        let out = testing::run(run, snapshot).unwrap();
        assert_eq!(codes(&out), vec![StatusCode::AllOff, StatusCode::NoMulti]);
        assert_eq!(out.alerts()[0].level, Severity::Danger);
    }

    #[test]
    fn test_partial() {
        let snapshot = AccountSnapshot {
            trails: vec![trail("a", true, true), trail("b", false, false)],
            ..AccountSnapshot::default()
        };
        let out = testing::run(run, snapshot).unwrap();
        assert_eq!(codes(&out), vec![StatusCode::Warning, StatusCode::Warning]);
    }

    #[test]
    fn test_error_suppresses_multi_region_alert() {
        let snapshot = AccountSnapshot {
            trails: vec![trail("a", true, true), trail("b", true, true)],
            ..AccountSnapshot::default()
        }
        .fail(
            format!("get_trail_status:{}", trail("b", true, true).arn),
            ssb_core::ApiError::new("TrailNotFoundException", "trail vanished"),
        );
        let out = testing::run(run, snapshot).unwrap();
        assert_eq!(codes(&out), vec![StatusCode::Error]);
        assert!(testing::texts(&out.alerts()[0]).contains(&"trail vanished"));
        assert_eq!(out.row_count(), 1);
    }
}
