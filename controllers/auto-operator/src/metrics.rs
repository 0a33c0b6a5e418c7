//! Prometheus metrics for the reconcile loop.

use crate::error::ControllerError;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Reconciliation counters and timings, registered in a private registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    reconciliations: IntCounterVec,
    duration: Histogram,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> Result<Self, ControllerError> {
        let registry = Registry::new();

        let reconciliations = IntCounterVec::new(
            Opts::new(
                "rmc_reconciliations_total",
                "Channel reconciliation passes grouped by outcome",
            ),
            &["outcome"],
        )?;
        let duration = Histogram::with_opts(HistogramOpts::new(
            "rmc_reconcile_duration_seconds",
            "Duration of Channel reconciliation passes",
        ))?;

        registry.register(Box::new(reconciliations.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            reconciliations,
            duration,
        })
    }

    /// Records one finished pass
    pub fn observe(&self, outcome: &str, elapsed: Duration) {
        self.reconciliations.with_label_values(&[outcome]).inc();
        self.duration.observe(elapsed.as_secs_f64());
    }

    /// Number of passes recorded with `outcome`
    #[cfg(test)]
    pub fn count(&self, outcome: &str) -> u64 {
        self.reconciliations.with_label_values(&[outcome]).get()
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String, ControllerError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
