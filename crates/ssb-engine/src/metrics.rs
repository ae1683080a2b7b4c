//! Global atomic counters for audit runs.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single `tracing::info!`
//! event, typically once at the end of a CLI run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    units_run: AtomicU64,
    units_synthesized: AtomicU64,
    fanout_candidates: AtomicU64,
    fanout_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            units_run: AtomicU64::new(0),
            units_synthesized: AtomicU64::new(0),
            fanout_candidates: AtomicU64::new(0),
            fanout_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_units_run(&self) {
        self.units_run.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "units_run", "counter incremented");
    }

    /// A unit failed outright and its record was synthesized by the engine.
    pub fn inc_units_synthesized(&self) {
        self.units_synthesized.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "units_synthesized", "counter incremented");
    }

    pub fn add_fanout_candidates(&self, n: u64) {
        self.fanout_candidates.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_fanout_failures(&self) {
        self.fanout_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "fanout_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            units_run = self.units_run(),
            units_synthesized = self.units_synthesized(),
            fanout_candidates = self.fanout_candidates(),
            fanout_failures = self.fanout_failures(),
        );
    }

    pub fn units_run(&self) -> u64 {
        self.units_run.load(Ordering::Relaxed)
    }

    pub fn units_synthesized(&self) -> u64 {
        self.units_synthesized.load(Ordering::Relaxed)
    }

    pub fn fanout_candidates(&self) -> u64 {
        self.fanout_candidates.load(Ordering::Relaxed)
    }

    pub fn fanout_failures(&self) -> u64 {
        self.fanout_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.units_run.store(0, Ordering::Relaxed);
        self.units_synthesized.store(0, Ordering::Relaxed);
        self.fanout_candidates.store(0, Ordering::Relaxed);
        self.fanout_failures.store(0, Ordering::Relaxed);
    }
}
