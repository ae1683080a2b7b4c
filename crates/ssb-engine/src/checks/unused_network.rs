//! 08: VPCs and subnets without in-use network interfaces, per region.

use std::collections::BTreeSet;

use ssb_core::{AlertTopic, ApiResult, Cell, CheckId, CheckReport, CloudApi, StatusCode, Table};

use super::{alert, CheckContext};
use crate::error::Result;
use crate::fanout::fan_out;

#[derive(Debug, Clone, PartialEq, Eq)]
struct RegionUsage {
    vpcs_in_use: usize,
    vpcs: usize,
    default_vpcs: usize,
    subnets_in_use: usize,
    subnets: usize,
    default_subnets: usize,
}

fn usage(api: &dyn CloudApi, region: &str) -> ApiResult<RegionUsage> {
    let mut vpcs_in_use = BTreeSet::new();
    let mut subnets_in_use = BTreeSet::new();
    for eni in api.describe_network_interfaces(region)? {
        if eni.in_use() {
            vpcs_in_use.insert(eni.vpc_id);
            subnets_in_use.insert(eni.subnet_id);
        }
    }
    let vpcs = api.describe_vpcs(region)?;
    let subnets = api.describe_subnets(region)?;

    Ok(RegionUsage {
        vpcs_in_use: vpcs_in_use.len(),
        vpcs: vpcs.len(),
        default_vpcs: vpcs.iter().filter(|v| v.is_default).count(),
        subnets_in_use: subnets_in_use.len(),
        subnets: subnets.len(),
        default_subnets: subnets.iter().filter(|s| s.default_for_az).count(),
    })
}

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let mut table = Table::new(&[
        "Region",
        "VPCs in use",
        "VPCs created (default)",
        "Subnets in use",
        "Subnets created (default)",
    ]);

    let regions = match ctx.api.describe_regions() {
        Ok(r) => r,
        Err(e) => {
            let alerts = vec![alert(AlertTopic::UnusedNetwork, StatusCode::Error)?.with_detail(e.message)];
            return Ok(CheckReport::new(CheckId::UnusedNetwork, alerts, vec![table]));
        }
    };

    for candidate in fan_out(ctx, "count_network_usage", regions, usage) {
        let row: Vec<Cell> = match candidate.outcome {
            Ok(u) => vec![
                candidate.key.into(),
                u.vpcs_in_use.into(),
                format!("{} ({})", u.vpcs, u.default_vpcs).into(),
                u.subnets_in_use.into(),
                format!("{} ({})", u.subnets, u.default_subnets).into(),
            ],
            Err(_) => vec![
                candidate.key.into(),
                "-".into(),
                "-".into(),
                "-".into(),
                "-".into(),
            ],
        };
        table.push_row(row)?;
    }

    let alerts = vec![alert(AlertTopic::UnusedNetwork, StatusCode::Warning)?];
    Ok(CheckReport::new(CheckId::UnusedNetwork, alerts, vec![table]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing;
    use ssb_core::{AccountSnapshot, ApiError, NetworkInterface, RegionState, Severity, Subnet, Vpc};

    fn eni(status: &str, vpc: &str, subnet: &str) -> NetworkInterface {
        NetworkInterface {
            status: status.into(),
            vpc_id: vpc.into(),
            subnet_id: subnet.into(),
        }
    }

    fn busy_region() -> RegionState {
        RegionState {
            network_interfaces: vec![
                eni("in-use", "vpc-1", "subnet-a"),
                eni("in-use", "vpc-1", "subnet-b"),
                eni("available", "vpc-2", "subnet-c"),
            ],
            vpcs: vec![
                Vpc {
                    vpc_id: "vpc-1".into(),
                    is_default: true,
                },
                Vpc {
                    vpc_id: "vpc-2".into(),
                    is_default: false,
                },
            ],
            subnets: vec![
                Subnet {
                    subnet_id: "subnet-a".into(),
                    default_for_az: true,
                },
                Subnet {
                    subnet_id: "subnet-b".into(),
                    default_for_az: true,
                },
                Subnet {
                    subnet_id: "subnet-c".into(),
                    default_for_az: false,
                },
            ],
            ..RegionState::default()
        }
    }

    fn rendered(report: &CheckReport) -> Vec<Vec<String>> {
        report.tables()[0]
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_counts_usage_per_region_sorted() {
        let mut snapshot = AccountSnapshot::default();
        snapshot.regions.insert("us-west-2".into(), busy_region());
        snapshot.regions.insert("eu-central-1".into(), RegionState::default());

        let out = testing::run(run, snapshot).unwrap();
        assert_eq!(
            rendered(&out),
            vec![
                vec!["eu-central-1", "0", "0 (0)", "0", "0 (0)"],
                vec!["us-west-2", "1", "2 (1)", "2", "3 (2)"],
            ]
        );
        assert_eq!(out.alerts()[0].level, Severity::Warning);
        assert!(out.alerts()[0].message.iter().any(|p| p.link.contains("ec2globalview")));
    }

    #[test]
    fn test_failed_region_gets_placeholder_row() {
        let mut snapshot = AccountSnapshot::default();
        snapshot.regions.insert("us-west-2".into(), busy_region());
        snapshot.regions.insert("af-south-1".into(), busy_region());
        let snapshot = snapshot.fail(
            "describe_subnets:af-south-1",
            ApiError::new("OptInRequired", "region not opted in"),
        );

        let out = testing::run(run, snapshot).unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(rendered(&out)[0], vec!["af-south-1", "-", "-", "-", "-"]);
        assert_eq!(rendered(&out)[1][0], "us-west-2");
    }
}
