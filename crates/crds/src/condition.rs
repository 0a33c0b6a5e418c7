//! Status conditions.
//!
//! Follows the Kubernetes `metav1.Condition` shape. Conditions are kept as a
//! list that holds at most one entry per type.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type reporting overall readiness of a Channel
pub const READY_CONDITION: &str = "Ready";

/// Condition type written by the drift detector
pub const DRIFT_CONDITION: &str = "DriftDetected";

/// Tri-state condition status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// A single observation about a resource
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, unique within a status
    #[serde(rename = "type")]
    pub type_: String,

    pub status: ConditionStatus,

    /// Machine-readable reason code
    pub reason: String,

    /// Human-readable detail
    #[serde(default)]
    pub message: String,

    /// Last time `status`, `reason` or `message` changed
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: now,
        }
    }

    fn same_observation(&self, other: &Condition) -> bool {
        self.status == other.status && self.reason == other.reason && self.message == other.message
    }
}

/// Looks up a condition by type.
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Merges `desired` into `conditions`.
///
/// Appends when no condition of that type exists, replaces in place when
/// status, reason or message differ, and otherwise leaves the existing entry
/// (and its transition time) untouched. Returns whether anything changed.
pub fn upsert_condition(conditions: &mut Vec<Condition>, desired: Condition) -> bool {
    match conditions.iter_mut().find(|c| c.type_ == desired.type_) {
        None => {
            conditions.push(desired);
            true
        }
        Some(existing) if !existing.same_observation(&desired) => {
            *existing = desired;
            true
        }
        Some(_) => false,
    }
}
