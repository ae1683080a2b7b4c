//! Inner fan-out for checks that query every region or bucket.
//!
//! Candidates are sorted before submission, every candidate becomes one
//! operation on the unit's inner pool, and the results come back zipped with
//! their candidate in that sorted order. Each candidate succeeds or fails on
//! its own; the calling unit decides what a failure means for its row.

use std::sync::Arc;

use ssb_core::{ApiError, ApiResult, CloudApi};

use crate::checks::CheckContext;
use crate::error::PoolError;
use crate::metrics::METRICS;

/// Why one candidate produced no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl CandidateError {
    /// Human text for alert details.
    pub fn detail(&self) -> String {
        match self {
            CandidateError::Api(e) => e.message.clone(),
            CandidateError::Pool(e) => e.to_string(),
        }
    }
}

/// One candidate and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<T> {
    pub key: String,
    pub outcome: Result<T, CandidateError>,
}

/// Run `op` once per candidate on `ctx.fanout` and wait for all of them.
///
/// Blocks the calling thread; call it from inside a check unit. The returned
/// vector has exactly one entry per input candidate, sorted by key.
pub fn fan_out<T, F>(
    ctx: &CheckContext,
    operation: &str,
    mut candidates: Vec<String>,
    op: F,
) -> Vec<Candidate<T>>
where
    T: Send + 'static,
    F: Fn(&dyn CloudApi, &str) -> ApiResult<T> + Send + Sync + 'static,
{
    candidates.sort();
    let op = Arc::new(op);

    let tasks = candidates
        .iter()
        .map(|key| {
            let api = Arc::clone(&ctx.api);
            let op = Arc::clone(&op);
            let target = key.clone();
            ctx.fanout
                .submit(format!("{operation}:{key}"), move || op(api.as_ref(), &target))
        })
        .collect();

    let results = ctx.fanout.wait_all(tasks);
    METRICS.add_fanout_candidates(candidates.len() as u64);

    candidates
        .into_iter()
        .zip(results)
        .map(|(key, result)| {
            let outcome = match result {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(CandidateError::Api(e)),
                Err(e) => Err(CandidateError::Pool(e)),
            };
            if let Err(e) = &outcome {
                METRICS.inc_fanout_failures();
                tracing::debug!(operation, candidate = %key, error = %e, "fan-out candidate failed");
            }
            Candidate { key, outcome }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing;
    use ssb_core::{AccountSnapshot, LatencyApi, MetricAlarm, RegionState};
    use std::time::Duration;

    fn regions(names: &[&str]) -> AccountSnapshot {
        let mut snapshot = AccountSnapshot::default();
        for name in names {
            snapshot.regions.insert(
                name.to_string(),
                RegionState {
                    alarms: vec![MetricAlarm {
                        alarm_arn: format!("arn:aws:cloudwatch:{name}:1:alarm:a"),
                    }],
                    ..RegionState::default()
                },
            );
        }
        snapshot
    }

    #[test]
    fn test_results_sorted_by_candidate_despite_latency() {
        let api = LatencyApi::new(regions(&["us-east-1", "eu-west-1", "ap-south-1"]))
            .with_delay("describe_alarms:ap-south-1", Duration::from_millis(80))
            .with_delay("describe_alarms:eu-west-1", Duration::from_millis(40));

        let results = testing::with_context(Arc::new(api), |ctx| {
            fan_out(
                ctx,
                "describe_alarms",
                vec!["us-east-1".into(), "eu-west-1".into(), "ap-south-1".into()],
                |api, region| api.describe_alarms(region).map(|a| a.len()),
            )
        });

        let keys: Vec<&str> = results.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["ap-south-1", "eu-west-1", "us-east-1"]);
        assert!(results.iter().all(|c| c.outcome == Ok(1)));
    }

    #[test]
    fn test_one_failure_stays_local() {
        let snapshot = regions(&["a", "b", "c"]).fail(
            "describe_alarms:b",
            ApiError::new("AccessDenied", "region disabled"),
        );
        let results = testing::with_context(Arc::new(snapshot), |ctx| {
            fan_out(
                ctx,
                "describe_alarms",
                vec!["c".into(), "b".into(), "a".into()],
                |api, region| api.describe_alarms(region),
            )
        });

        assert_eq!(results.len(), 3);
        assert!(results[0].outcome.is_ok());
        assert_eq!(
            results[1].outcome.as_ref().unwrap_err().detail(),
            "region disabled"
        );
        assert!(results[2].outcome.is_ok());
    }

    #[test]
    fn test_panicking_candidate_becomes_pool_error() {
        let results = testing::with_context(Arc::new(AccountSnapshot::default()), |ctx| {
            fan_out(ctx, "probe", vec!["x".into(), "y".into()], |_, key| {
                if key == "x" {
                    panic!("bad candidate");
                }
                Ok(key.len())
            })
        });

        assert!(matches!(
            results[0].outcome,
            Err(CandidateError::Pool(PoolError::Panicked { .. }))
        ));
        assert_eq!(results[1].outcome, Ok(1));
    }

    #[test]
    fn test_empty_candidate_list() {
        let results: Vec<Candidate<()>> =
            testing::with_context(Arc::new(AccountSnapshot::default()), |ctx| {
                fan_out(ctx, "noop", Vec::new(), |_, _| Ok(()))
            });
        assert!(results.is_empty());
    }
}
