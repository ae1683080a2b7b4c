//! 07: CloudWatch alarms exist in at least one region.

use ssb_core::{AlertTopic, CheckId, CheckReport, StatusCode, Table};

use super::{alert, CheckContext};
use crate::error::Result;
use crate::fanout::fan_out;

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let mut table = Table::new(&["Region", "Name"]);

    let regions = match ctx.api.describe_regions() {
        Ok(r) => r,
        Err(e) => {
            let alerts = vec![
                alert(AlertTopic::Alarms, StatusCode::Error)?.with_detail(e.message),
                alert(AlertTopic::Alarms, StatusCode::Info)?,
            ];
            return Ok(CheckReport::new(CheckId::Alarms, alerts, vec![table]));
        }
    };

    let results = fan_out(ctx, "describe_alarms", regions, |api, region| {
        api.describe_alarms(region)
    });
    let queried = results.len();

    let mut found = Vec::new();
    let mut unreadable = Vec::new();
    let mut last_error = String::new();
    for candidate in results {
        match candidate.outcome {
            Ok(alarms) => {
                for alarm in alarms {
                    let region = alarm.region().unwrap_or(candidate.key.as_str()).to_string();
                    let name = alarm.name().unwrap_or(alarm.alarm_arn.as_str()).to_string();
                    found.push((region, name));
                }
            }
            Err(e) => {
                last_error = e.detail();
                unreadable.push(candidate.key);
            }
        }
    }
    found.sort();

    for (region, name) in &found {
        table.push_row(vec![region.into(), name.into()])?;
    }

    // Nothing was read, so the absence of alarms proves nothing.
    let status = if queried > 0 && unreadable.len() == queried {
        alert(AlertTopic::Alarms, StatusCode::Error)?.with_detail(last_error)
    } else {
        let code = if found.is_empty() {
            StatusCode::NoAlarm
        } else {
            StatusCode::Success
        };
        alert(AlertTopic::Alarms, code)?
    };
    let status = if unreadable.is_empty() {
        status
    } else {
        status.with_detail(format!(
            "Alarms could not be read in: {}",
            unreadable.join(", ")
        ))
    };

    let alerts = vec![status, alert(AlertTopic::Alarms, StatusCode::Info)?];
    Ok(CheckReport::new(CheckId::Alarms, alerts, vec![table]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing;
    use ssb_core::{AccountSnapshot, ApiError, LatencyApi, MetricAlarm, RegionState, Severity};
    use std::sync::Arc;
    use std::time::Duration;

    fn alarm(region: &str, name: &str) -> MetricAlarm {
        MetricAlarm {
            alarm_arn: format!("arn:aws:cloudwatch:{region}:123456789012:alarm:{name}"),
        }
    }

    fn snapshot(regions: &[(&str, &[&str])]) -> AccountSnapshot {
        let mut snapshot = AccountSnapshot::default();
        for (region, names) in regions {
            snapshot.regions.insert(
                region.to_string(),
                RegionState {
                    alarms: names.iter().map(|n| alarm(region, n)).collect(),
                    ..RegionState::default()
                },
            );
        }
        snapshot
    }

    fn rows(report: &CheckReport) -> Vec<String> {
        report.tables()[0]
            .rows
            .iter()
            .map(|r| format!("{}/{}", r[0], r[1]))
            .collect()
    }

    #[test]
    fn test_alarms_sorted_across_regions() {
        let api = LatencyApi::new(snapshot(&[
            ("us-east-1", &["root-login", "billing"]),
            ("eu-west-1", &["cpu"]),
            ("ap-northeast-2", &[]),
        ]))
        .with_delay("describe_alarms:eu-west-1", Duration::from_millis(50));

        let out = testing::run_with(run, Arc::new(api)).unwrap();
        assert_eq!(
            rows(&out),
            vec!["eu-west-1/cpu", "us-east-1/billing", "us-east-1/root-login"]
        );
        assert_eq!(out.alerts()[0].level, Severity::Success);
        assert_eq!(out.alerts()[1].level, Severity::Info);
    }

    #[test]
    fn test_no_alarms_anywhere() {
        let out = testing::run(run, snapshot(&[("us-east-1", &[]), ("eu-west-1", &[])])).unwrap();
        assert_eq!(out.alerts()[0].code, StatusCode::NoAlarm);
        assert_eq!(out.row_count(), 0);
    }

    #[test]
    fn test_failed_region_named_in_status() {
        let snapshot = snapshot(&[("us-east-1", &["billing"]), ("me-south-1", &["x"])]).fail(
            "describe_alarms:me-south-1",
            ApiError::new("UnrecognizedClientException", "region not enabled"),
        );
        let out = testing::run(run, snapshot).unwrap();
        assert_eq!(rows(&out), vec!["us-east-1/billing"]);
        let texts = testing::texts(&out.alerts()[0]);
        assert!(texts.contains(&"Alarms could not be read in: me-south-1"));
    }

    #[test]
    fn test_every_region_unreadable_is_error() {
        let mut snapshot = snapshot(&[("us-east-1", &[]), ("eu-west-1", &[]), ("ap-northeast-2", &[])]);
        for region in ["us-east-1", "eu-west-1", "ap-northeast-2"] {
            snapshot = snapshot.fail(
                format!("describe_alarms:{region}"),
                ApiError::new("AccessDenied", "cloudwatch:DescribeAlarms denied"),
            );
        }
        let out = testing::run(run, snapshot).unwrap();
        assert!(out.has_error());
        assert_eq!(out.alerts()[0].code, StatusCode::Error);
        assert!(out.alert_with(StatusCode::NoAlarm).is_none());
        let texts = testing::texts(&out.alerts()[0]);
        assert!(texts.contains(&"cloudwatch:DescribeAlarms denied"));
        assert!(texts.contains(&"Alarms could not be read in: ap-northeast-2, eu-west-1, us-east-1"));
        assert_eq!(out.row_count(), 0);
    }

    #[test]
    fn test_region_listing_error() {
        let snapshot =
            AccountSnapshot::default().fail("describe_regions", ApiError::new("AuthFailure", "bad creds"));
        let out = testing::run(run, snapshot).unwrap();
        assert_eq!(out.alerts()[0].level, Severity::Error);
        assert!(testing::texts(&out.alerts()[0]).contains(&"bad creds"));
    }
}
