//! Structured lifecycle events for audit runs.
//!
//! Provides an `AuditSpan` that tags everything logged during one run with
//! its `run_id`, and emitters for the start, per-unit outcome,
//! priming and finish events.

use tracing::{info, warn};

use ssb_core::CheckId;

/// Run-scoped span carrying the `run_id`.
///
/// Async code attaches it with `Instrument`; blocking workers enter it for
/// the duration of their operation.
#[derive(Debug, Clone)]
pub struct AuditSpan {
    span: tracing::Span,
}

impl AuditSpan {
    pub fn new(run_id: &str) -> Self {
        Self {
            span: tracing::info_span!("ssb.audit", run_id = %run_id),
        }
    }

    pub fn span(&self) -> tracing::Span {
        self.span.clone()
    }

    /// Enter the span on the current thread. Do not hold across `.await`.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

pub fn emit_audit_started(run_id: &str, checks: usize) {
    info!(event = "audit.started", run_id = %run_id, checks = checks);
}

pub fn emit_unit_finished(check: CheckId, title: &str, elapsed_ms: u64, alerts: usize, rows: usize) {
    info!(
        event = "unit.finished",
        check = %check,
        title = %title,
        elapsed_ms = elapsed_ms,
        alerts = alerts,
        rows = rows,
    );
}

/// A unit escaped with an error; its record is synthesized.
pub fn emit_unit_failed(check: CheckId, error: &dyn std::fmt::Display) {
    warn!(event = "unit.failed", check = %check, error = %error);
}

/// The credential-report warm-up call failed. The run continues.
pub fn emit_priming_skipped(error: &dyn std::fmt::Display) {
    warn!(event = "audit.priming_skipped", error = %error);
}

pub fn emit_audit_finished(run_id: &str, duration_ms: u64, records: usize, failed: usize) {
    info!(
        event = "audit.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        records = records,
        failed = failed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_span_create() {
        let span = AuditSpan::new("test-run-id");
        let _guard = span.enter();
        emit_audit_started("test-run-id", 3);
        emit_unit_finished(CheckId::CloudTrail, "05 Turn CloudTrail On", 12, 2, 1);
    }
}
