//! The ten baseline check units and their registry.
//!
//! Every unit is a plain blocking function `&CheckContext -> Result<CheckReport>`.
//! Provider errors a unit understands become alerts inside its record; any
//! error it returns is turned into a synthetic Error record by the engine.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ssb_core::{Alert, AlertTopic, CheckId, CheckReport, CloudApi, StatusCode};

use crate::error::Result;
use crate::pool::WorkPool;

mod alarms;
mod cloudtrail;
mod contacts;
pub mod credential_report;
mod guardduty;
mod human_identities;
mod public_access;
mod root_user;
mod trusted_advisor;
mod unused_network;
mod user_groups;

/// Everything a unit may touch while it runs.
#[derive(Clone)]
pub struct CheckContext {
    pub api: Arc<dyn CloudApi>,
    /// Inner pool owned by this unit for its fan-out sub-operations.
    pub fanout: WorkPool,
    /// Clock captured once per run.
    pub now: DateTime<Utc>,
    pub home_region: String,
    pub support_region: String,
}

impl fmt::Debug for CheckContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckContext")
            .field("fanout", &self.fanout.name())
            .field("now", &self.now)
            .field("home_region", &self.home_region)
            .field("support_region", &self.support_region)
            .finish_non_exhaustive()
    }
}

/// Resolve a status through the catalog.
pub(crate) fn alert(topic: AlertTopic, code: StatusCode) -> Result<Alert> {
    Ok(Alert::resolve(topic, code)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// A fixed handful of gate calls.
    Flat,
    /// Queries every region or bucket through the unit's inner pool.
    FanOut,
}

impl CheckKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::Flat => "flat",
            CheckKind::FanOut => "fan-out",
        }
    }
}

pub type CheckFn = Arc<dyn Fn(&CheckContext) -> Result<CheckReport> + Send + Sync>;

/// Immutable description of one check unit.
#[derive(Clone)]
pub struct CheckDescriptor {
    pub id: CheckId,
    pub kind: CheckKind,
    run: CheckFn,
}

impl CheckDescriptor {
    pub fn title(&self) -> &'static str {
        self.id.title()
    }

    pub fn run(&self, ctx: &CheckContext) -> Result<CheckReport> {
        (self.run)(ctx)
    }
}

impl fmt::Debug for CheckDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Check units by id, fixed before a run starts.
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    units: BTreeMap<CheckId, CheckDescriptor>,
}

impl CheckRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The ten baseline checks.
    pub fn builtin() -> Self {
        use CheckKind::{FanOut, Flat};

        Self::empty()
            .with(CheckId::AccurateInformation, Flat, contacts::run)
            .with(CheckId::ProtectRootUser, Flat, root_user::run)
            .with(CheckId::HumanIdentities, Flat, human_identities::run)
            .with(CheckId::UserGroups, Flat, user_groups::run)
            .with(CheckId::CloudTrail, Flat, cloudtrail::run)
            .with(CheckId::PublicAccess, FanOut, public_access::run)
            .with(CheckId::Alarms, FanOut, alarms::run)
            .with(CheckId::UnusedNetwork, FanOut, unused_network::run)
            .with(CheckId::TrustedAdvisor, Flat, trusted_advisor::run)
            .with(CheckId::GuardDuty, Flat, guardduty::run)
    }

    /// Register (or replace) the unit for `id`.
    pub fn with<F>(mut self, id: CheckId, kind: CheckKind, run: F) -> Self
    where
        F: Fn(&CheckContext) -> Result<CheckReport> + Send + Sync + 'static,
    {
        self.units.insert(
            id,
            CheckDescriptor {
                id,
                kind,
                run: Arc::new(run),
            },
        );
        self
    }

    pub fn get(&self, id: CheckId) -> Option<&CheckDescriptor> {
        self.units.get(&id)
    }

    /// Descriptors in id order.
    pub fn descriptors(&self) -> impl Iterator<Item = &CheckDescriptor> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ssb_core::AccountSnapshot;

    #[test]
    fn test_builtin_registers_every_check() {
        let registry = CheckRegistry::builtin();
        assert_eq!(registry.len(), 10);
        let ids: Vec<CheckId> = registry.descriptors().map(|d| d.id).collect();
        assert_eq!(ids, CheckId::ALL.to_vec());
    }

    #[test]
    fn test_fanout_units_are_marked() {
        let registry = CheckRegistry::builtin();
        let fanout: Vec<CheckId> = registry
            .descriptors()
            .filter(|d| d.kind == CheckKind::FanOut)
            .map(|d| d.id)
            .collect();
        assert_eq!(
            fanout,
            vec![CheckId::PublicAccess, CheckId::Alarms, CheckId::UnusedNetwork]
        );
    }

    #[test]
    fn test_with_replaces_existing_unit() {
        let registry = CheckRegistry::builtin().with(CheckId::GuardDuty, CheckKind::Flat, |_| {
            Ok(CheckReport::failed(CheckId::GuardDuty, "stub"))
        });
        assert_eq!(registry.len(), 10);

        let unit = registry.get(CheckId::GuardDuty).unwrap().clone();
        let report = testing::with_context(Arc::new(AccountSnapshot::default()), |ctx| unit.run(ctx))
            .unwrap();
        assert_eq!(testing::texts(&report.alerts()[0]), vec!["stub"]);
    }
}
