//! Orchestration engine.
//!
//! [`AuditEngine::run`] schedules every requested check unit on the outer
//! pool, waits for all of them, and returns one record per requested id
//! ordered by title. Nothing escapes `run`: a unit that errors, panics or
//! times out is replaced by a synthetic record carrying an Error alert.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::Instrument;
use uuid::Uuid;

use ssb_core::{CheckId, CheckReport, CloudApi};

use crate::checks::{CheckContext, CheckRegistry};
use crate::config::EngineConfig;
use crate::error::{AuditError, PoolError, Result};
use crate::metrics::METRICS;
use crate::obs::{
    emit_audit_finished, emit_audit_started, emit_priming_skipped, emit_unit_failed,
    emit_unit_finished, AuditSpan,
};
use crate::pool::{PoolTask, WorkPool};

type UnitOutput = (Result<CheckReport>, u64);

/// The records of one run plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub results: Vec<CheckReport>,
}

pub struct AuditEngine {
    api: Arc<dyn CloudApi>,
    registry: CheckRegistry,
    config: EngineConfig,
    outer: WorkPool,
}

impl AuditEngine {
    /// Engine running the ten built-in checks. Must be called inside a tokio runtime.
    pub fn new(api: Arc<dyn CloudApi>, config: EngineConfig) -> Result<Self> {
        Self::with_registry(api, CheckRegistry::builtin(), config)
    }

    pub fn with_registry(
        api: Arc<dyn CloudApi>,
        registry: CheckRegistry,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let outer = WorkPool::new("outer", config.outer_workers)?;
        Ok(Self {
            api,
            registry,
            config,
            outer,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Run the requested checks. Duplicate ids count once.
    pub async fn run(&self, ids: impl IntoIterator<Item = CheckId>) -> Vec<CheckReport> {
        self.audit(ids).await.results
    }

    /// Same as [`run`](Self::run), keeping the run id and start time.
    pub async fn audit(&self, ids: impl IntoIterator<Item = CheckId>) -> AuditRun {
        let requested: BTreeSet<CheckId> = ids.into_iter().collect();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = AuditSpan::new(&run_id.to_string());

        let results = self
            .execute(requested, run_id, started_at, span.clone())
            .instrument(span.span())
            .await;

        AuditRun {
            run_id,
            started_at,
            results,
        }
    }

    async fn execute(
        &self,
        requested: BTreeSet<CheckId>,
        run_id: Uuid,
        started_at: DateTime<Utc>,
        span: AuditSpan,
    ) -> Vec<CheckReport> {
        let clock = Instant::now();
        let run_label = run_id.to_string();
        emit_audit_started(&run_label, requested.len());

        if self.config.prime_credential_report {
            self.prime().await;
        }

        let pending: Vec<(CheckId, Option<PoolTask<UnitOutput>>)> = requested
            .into_iter()
            .map(|id| (id, self.submit(id, started_at, &span)))
            .collect();

        let settled = join_all(
            pending
                .into_iter()
                .map(|(id, task)| async move { (id, settle(id, task).await) }),
        )
        .await;

        let mut failed = 0usize;
        let mut results: Vec<CheckReport> = settled
            .into_iter()
            .map(|(id, outcome)| {
                METRICS.inc_units_run();
                match outcome {
                    Ok((record, elapsed_ms)) => {
                        emit_unit_finished(
                            id,
                            record.title(),
                            elapsed_ms,
                            record.alerts().len(),
                            record.row_count(),
                        );
                        record
                    }
                    Err(e) => {
                        failed += 1;
                        METRICS.inc_units_synthesized();
                        emit_unit_failed(id, &e);
                        CheckReport::failed(id, e.to_string())
                    }
                }
            })
            .collect();

        results.sort_by(|a, b| a.title().cmp(b.title()));

        emit_audit_finished(
            &run_label,
            clock.elapsed().as_millis() as u64,
            results.len(),
            failed,
        );
        results
    }

    /// Best-effort credential report warm-up. Failure is logged and ignored.
    async fn prime(&self) {
        let api = Arc::clone(&self.api);
        let outcome = self
            .outer
            .submit("generate_credential_report", move || {
                api.generate_credential_report()
            })
            .wait()
            .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => emit_priming_skipped(&e),
            Err(e) => emit_priming_skipped(&e),
        }
    }

    fn submit(
        &self,
        id: CheckId,
        now: DateTime<Utc>,
        span: &AuditSpan,
    ) -> Option<PoolTask<UnitOutput>> {
        let unit = self.registry.get(id)?.clone();
        let ctx = CheckContext {
            api: Arc::clone(&self.api),
            fanout: WorkPool::with_handle(
                format!("fanout:{:02}", id.number()),
                self.config.inner_workers,
                self.outer.runtime().clone(),
            ),
            now,
            home_region: self.config.home_region.clone(),
            support_region: self.config.support_region.clone(),
        };
        let span = span.clone();

        let limit = self.config.unit_timeout;

        Some(self.outer.submit_with_limit(id.to_string(), limit, move || {
            let _entered = span.enter();
            let start = Instant::now();
            let record = unit.run(&ctx);
            (record, start.elapsed().as_millis() as u64)
        }))
    }
}

/// Wait for one unit and flatten every way it can fail into an [`AuditError`].
async fn settle(id: CheckId, task: Option<PoolTask<UnitOutput>>) -> Result<(CheckReport, u64)> {
    let task = task.ok_or(AuditError::Unregistered(id))?;
    let (record, elapsed_ms) = task.wait().await.map_err(|e| match e {
        PoolError::TimedOut { limit, .. } => AuditError::TimedOut { check: id, limit },
        other => AuditError::Pool(other),
    })?;
    Ok((record?, elapsed_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckKind;
    use ssb_core::{AccountSnapshot, ApiError};
    use std::time::Duration;

    fn stub(id: CheckId) -> impl Fn(&CheckContext) -> Result<CheckReport> + Send + Sync + 'static {
        move |_| Ok(CheckReport::new(id, Vec::new(), Vec::new()))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_duplicates_count_once() {
        let engine = AuditEngine::new(Arc::new(AccountSnapshot::default()), EngineConfig::default())
            .unwrap();
        let results = engine
            .run([CheckId::GuardDuty, CheckId::GuardDuty, CheckId::TrustedAdvisor])
            .await;
        let ids: Vec<CheckId> = results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![CheckId::TrustedAdvisor, CheckId::GuardDuty]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unregistered_id_is_synthesized() {
        let registry = CheckRegistry::empty().with(CheckId::Alarms, CheckKind::Flat, stub(CheckId::Alarms));
        let engine = AuditEngine::with_registry(
            Arc::new(AccountSnapshot::default()),
            registry,
            EngineConfig::default(),
        )
        .unwrap();

        let results = engine.run([CheckId::Alarms, CheckId::CloudTrail]).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].has_error());
        assert_eq!(results[0].id(), CheckId::CloudTrail);
        assert!(!results[1].has_error());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_escaped_error_becomes_record() {
        let registry = CheckRegistry::empty().with(CheckId::UserGroups, CheckKind::Flat, |_| {
            Err(ApiError::new("Throttling", "Rate exceeded").into())
        });
        let engine = AuditEngine::with_registry(
            Arc::new(AccountSnapshot::default()),
            registry,
            EngineConfig::default(),
        )
        .unwrap();

        let results = engine.run([CheckId::UserGroups]).await;
        let alert = &results[0].alerts()[0];
        assert!(alert.level.is_error());
        assert!(alert.message[0].text.contains("Rate exceeded"));
        assert_eq!(results[0].title(), "04 Use User Groups");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_timeout_synthesizes_record() {
        let registry = CheckRegistry::empty()
            .with(CheckId::Alarms, CheckKind::Flat, |_| {
                std::thread::sleep(Duration::from_millis(400));
                Ok(CheckReport::new(CheckId::Alarms, Vec::new(), Vec::new()))
            })
            .with(CheckId::GuardDuty, CheckKind::Flat, stub(CheckId::GuardDuty));
        let config = EngineConfig {
            unit_timeout: Some(Duration::from_millis(50)),
            prime_credential_report: false,
            ..EngineConfig::default()
        };
        let engine =
            AuditEngine::with_registry(Arc::new(AccountSnapshot::default()), registry, config)
                .unwrap();

        let results = engine.run([CheckId::Alarms, CheckId::GuardDuty]).await;
        assert!(results[0].has_error());
        assert_eq!(
            results[0].alerts()[0].message[0].text,
            "check07 did not finish within 50ms"
        );
        assert!(!results[1].has_error());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_queued_units_do_not_time_out() {
        let sleepy = |id: CheckId| {
            move |_: &CheckContext| {
                std::thread::sleep(Duration::from_millis(200));
                Ok::<_, AuditError>(CheckReport::new(id, Vec::new(), Vec::new()))
            }
        };
        let registry = CheckRegistry::empty()
            .with(CheckId::AccurateInformation, CheckKind::Flat, sleepy(CheckId::AccurateInformation))
            .with(CheckId::ProtectRootUser, CheckKind::Flat, sleepy(CheckId::ProtectRootUser))
            .with(CheckId::HumanIdentities, CheckKind::Flat, sleepy(CheckId::HumanIdentities));
        let config = EngineConfig {
            outer_workers: 1,
            unit_timeout: Some(Duration::from_millis(300)),
            prime_credential_report: false,
            ..EngineConfig::default()
        };
        let engine =
            AuditEngine::with_registry(Arc::new(AccountSnapshot::default()), registry, config)
                .unwrap();

        let results = engine
            .run([
                CheckId::AccurateInformation,
                CheckId::ProtectRootUser,
                CheckId::HumanIdentities,
            ])
            .await;
        assert_eq!(results.len(), 3);
        for record in &results {
            assert!(!record.has_error(), "{} timed out while queued", record.title());
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_config_rejected() {
        let config = EngineConfig {
            outer_workers: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            AuditEngine::new(Arc::new(AccountSnapshot::default()), config),
            Err(AuditError::InvalidConfig(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_audit_records_start_time() {
        let engine = AuditEngine::new(Arc::new(AccountSnapshot::default()), EngineConfig::default())
            .unwrap();
        let before = Utc::now();
        let run = engine.audit([CheckId::TrustedAdvisor]).await;
        assert!(run.started_at >= before);
        assert_eq!(run.results.len(), 1);
    }
}
