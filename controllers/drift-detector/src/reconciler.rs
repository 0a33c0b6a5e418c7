//! Drift reconciliation.
//!
//! On drift the Channel moves to `DriftDetected` with a matching `Ready`
//! condition and a `DriftDetected` condition. Once the detector reports the
//! Channel in sync again, an existing `DriftDetected` condition is flipped to
//! False; the phase is left for the auto-operator to recompute.

use crate::detector::DriftDetector;
use crate::error::ControllerError;
use chrono::Utc;
use crds::{
    find_condition, upsert_condition, ChannelPhase, Condition, ConditionStatus, ReadyReason,
    DRIFT_CONDITION,
};
use kube_runtime::controller::Action;
use kube_store::ObjectStore;
use std::time::Duration;
use tracing::{debug, info, warn};

const IN_SYNC_REASON: &str = "InSync";

/// Reconciles Channels against a drift detector.
pub struct Reconciler {
    store: Box<dyn ObjectStore>,
    detector: Box<dyn DriftDetector>,
    interval: Duration,
}

impl Reconciler {
    pub fn new(store: Box<dyn ObjectStore>, detector: Box<dyn DriftDetector>, interval: Duration) -> Self {
        Self {
            store,
            detector,
            interval,
        }
    }

    pub async fn reconcile_channel(&self, name: &str) -> Result<Action, ControllerError> {
        let Some(channel) = self.store.get_channel(name).await? else {
            debug!("Channel {} not found, skipping drift check", name);
            return Ok(Action::await_change());
        };
        if channel.is_deleting() {
            return Ok(Action::await_change());
        }

        let report = self.detector.detect_drift(&channel).await;
        let now = Utc::now();
        let mut status = channel.status.clone().unwrap_or_default();

        let changed = if report.drifted {
            warn!("Channel {} drifted: {}", name, report.details);
            let phase_changed = status.record(
                ChannelPhase::DriftDetected,
                ReadyReason::ConfigurationDrift,
                report.details.clone(),
                now,
            );
            let drift_changed = upsert_condition(
                &mut status.conditions,
                Condition::new(
                    DRIFT_CONDITION,
                    ConditionStatus::True,
                    ReadyReason::ConfigurationDrift.as_str(),
                    report.details,
                    now,
                ),
            );
            phase_changed || drift_changed
        } else if find_condition(&status.conditions, DRIFT_CONDITION).is_some() {
            upsert_condition(
                &mut status.conditions,
                Condition::new(
                    DRIFT_CONDITION,
                    ConditionStatus::False,
                    IN_SYNC_REASON,
                    "deployed stack matches the Channel",
                    now,
                ),
            )
        } else {
            false
        };

        if changed {
            let mut updated = channel;
            updated.status = Some(status);
            self.store.update_channel_status(&updated).await?;
            info!("Updated drift status of Channel {}", name);
        } else {
            debug!("Channel {}: no drift status change", name);
        }

        Ok(Action::requeue(self.interval))
    }
}
