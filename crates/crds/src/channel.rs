//! Channel CRD
//!
//! Declares which GPU vendor stack, on which release track, should run on
//! which downstream clusters.

use crate::condition::{upsert_condition, Condition, ConditionStatus, READY_CONDITION};
use crate::selector::ClusterSelector;
use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "multi.suse.io",
    version = "v1alpha1",
    kind = "Channel",
    status = "ChannelStatus",
    shortname = "gpuch",
    printcolumn = r#"{"name":"Vendor","type":"string","jsonPath":".spec.vendor"}"#,
    printcolumn = r#"{"name":"Channel","type":"string","jsonPath":".spec.channel"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".status.observedVersion"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSpec {
    /// GPU vendor (nvidia, amd, intel)
    ///
    /// Kept as a plain string so that an unsupported value can still be
    /// reported on the status instead of being rejected by deserialization.
    pub vendor: String,

    /// Release track (stable, lts, canary)
    ///
    /// Enforced by the API server; the controller parses it again before use.
    #[schemars(extend("enum" = ["stable", "lts", "canary"]))]
    pub channel: String,

    /// Which downstream clusters this channel applies to
    #[serde(default)]
    pub cluster_selector: ClusterSelector,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    /// "<operatorTag>/<runtimeTag>" of the pins last rolled out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_version: Option<String>,

    /// Coarse rollout phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<ChannelPhase>,

    /// Latest observations, one per type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Rollout phase of a Channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum ChannelPhase {
    /// Not yet reconciled, or deployment state could not be read
    Pending,
    /// Bundle written, clusters still converging
    RollingOut,
    /// Rollout held back
    Paused,
    /// Every matching cluster reports ready
    Completed,
    /// Input error or a failing BundleDeployment
    Failed,
    /// Deployed stack differs from the declared one
    DriftDetected,
}

impl ChannelPhase {
    /// Name as written to `status.phase`
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelPhase::Pending => "Pending",
            ChannelPhase::RollingOut => "RollingOut",
            ChannelPhase::Paused => "Paused",
            ChannelPhase::Completed => "Completed",
            ChannelPhase::Failed => "Failed",
            ChannelPhase::DriftDetected => "DriftDetected",
        }
    }

    /// Status the `Ready` condition must carry while in this phase
    pub fn ready_status(self) -> ConditionStatus {
        match self {
            ChannelPhase::Completed => ConditionStatus::True,
            ChannelPhase::Failed | ChannelPhase::DriftDetected => ConditionStatus::False,
            ChannelPhase::Pending | ChannelPhase::RollingOut | ChannelPhase::Paused => {
                ConditionStatus::Unknown
            }
        }
    }
}

impl fmt::Display for ChannelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason codes carried by the `Ready` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyReason {
    /// Bundle converged and deployments aggregated
    Reconciled,
    /// `spec.vendor` is not a supported vendor
    InvalidVendor,
    /// Track unsupported or its pins unreadable
    VersionResolutionError,
    /// No chart source configured for the vendor
    MissingVendorSource,
    /// Bundle create or update was rejected
    BundleCreationError,
    /// BundleDeployments could not be listed
    DeploymentListError,
    /// Drift detector found a difference
    ConfigurationDrift,
}

impl ReadyReason {
    /// Condition `reason` string
    pub fn as_str(self) -> &'static str {
        match self {
            ReadyReason::Reconciled => "Reconciled",
            ReadyReason::InvalidVendor => "InvalidVendor",
            ReadyReason::VersionResolutionError => "VersionResolutionError",
            ReadyReason::MissingVendorSource => "MissingVendorSource",
            ReadyReason::BundleCreationError => "BundleCreationError",
            ReadyReason::DeploymentListError => "DeploymentListError",
            ReadyReason::ConfigurationDrift => "ConfigurationDrift",
        }
    }
}

impl fmt::Display for ReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChannelStatus {
    /// Sets the phase together with a matching `Ready` condition.
    ///
    /// Returns true if the status differs from what it was before.
    pub fn record(
        &mut self,
        phase: ChannelPhase,
        reason: ReadyReason,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> bool {
        let phase_changed = self.phase != Some(phase);
        self.phase = Some(phase);
        let condition_changed = upsert_condition(
            &mut self.conditions,
            Condition::new(READY_CONDITION, phase.ready_status(), reason.as_str(), message, now),
        );
        phase_changed || condition_changed
    }

    /// Sets the observed version, returning true if it changed.
    pub fn observe_version(&mut self, version: &str) -> bool {
        if self.observed_version.as_deref() == Some(version) {
            return false;
        }
        self.observed_version = Some(version.to_string());
        true
    }
}

impl Channel {
    /// True once deletion has been requested
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// True if `finalizer` is present
    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.iter().any(|x| x == finalizer))
    }

    /// Adds the finalizer, returning false if it was already present
    pub fn add_finalizer(&mut self, finalizer: &str) -> bool {
        if self.has_finalizer(finalizer) {
            return false;
        }
        self.metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(finalizer.to_string());
        true
    }

    /// Removes the finalizer, returning false if it was absent
    pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
        let Some(finalizers) = self.metadata.finalizers.as_mut() else {
            return false;
        };
        let before = finalizers.len();
        finalizers.retain(|f| f != finalizer);
        finalizers.len() != before
    }

    /// Current phase, if any status was written
    pub fn phase(&self) -> Option<ChannelPhase> {
        self.status.as_ref().and_then(|s| s.phase)
    }

    /// Version last rolled out, if any
    pub fn observed_version(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.observed_version.as_deref())
    }
}
