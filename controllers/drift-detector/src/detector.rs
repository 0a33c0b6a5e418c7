//! Drift detection seam.
//!
//! A detector compares a Channel's declared intent with what is actually
//! running downstream. Only [`NoDrift`] ships today.

use async_trait::async_trait;
use crds::Channel;

/// Outcome of one drift check
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DriftReport {
    pub drifted: bool,
    /// Human-readable description of what differs
    pub details: String,
}

impl DriftReport {
    pub fn in_sync() -> Self {
        Self::default()
    }

    pub fn drifted(details: impl Into<String>) -> Self {
        Self {
            drifted: true,
            details: details.into(),
        }
    }
}

#[async_trait]
pub trait DriftDetector: Send + Sync {
    async fn detect_drift(&self, channel: &Channel) -> DriftReport;
}

/// Never reports drift
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDrift;

#[async_trait]
impl DriftDetector for NoDrift {
    async fn detect_drift(&self, _channel: &Channel) -> DriftReport {
        DriftReport::in_sync()
    }
}
