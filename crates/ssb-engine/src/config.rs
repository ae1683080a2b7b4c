//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

/// Sizing and environment for one [`AuditEngine`](crate::AuditEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Check units running at once.
    pub outer_workers: usize,
    /// Sub-operations running at once inside each fan-out unit.
    pub inner_workers: usize,
    /// Ask the provider to build the credential report before any unit starts.
    pub prime_credential_report: bool,
    /// Give up on a unit after this long, measured from submission. `None` waits forever.
    pub unit_timeout: Option<Duration>,
    /// Region queried by region-pinned checks (GuardDuty).
    pub home_region: String,
    /// Region hosting the support API (Trusted Advisor).
    pub support_region: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            outer_workers: 10,
            inner_workers: 20,
            prime_credential_report: true,
            unit_timeout: None,
            home_region: "ap-northeast-2".to_string(),
            support_region: "us-east-1".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.outer_workers == 0 {
            return Err(AuditError::InvalidConfig(
                "outer_workers must be at least 1".into(),
            ));
        }
        if self.inner_workers == 0 {
            return Err(AuditError::InvalidConfig(
                "inner_workers must be at least 1".into(),
            ));
        }
        if self.unit_timeout == Some(Duration::ZERO) {
            return Err(AuditError::InvalidConfig(
                "unit_timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.outer_workers, 10);
        assert_eq!(config.inner_workers, 20);
        assert!(config.prime_credential_report);
        assert!(config.unit_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_pools_rejected() {
        let config = EngineConfig {
            inner_workers: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AuditError::InvalidConfig(msg)) if msg.contains("inner_workers")
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "outer_workers": 2 }"#).unwrap();
        assert_eq!(config.outer_workers, 2);
        assert_eq!(config.inner_workers, 20);
        assert_eq!(config.home_region, "ap-northeast-2");
    }
}
