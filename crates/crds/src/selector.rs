//! Cluster selector shared by Channel and Fleet Bundle targets.
//!
//! Serializes exactly like a Kubernetes `LabelSelector` so it can be
//! embedded verbatim into Fleet targets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label predicate over downstream clusters.
///
/// An empty selector matches every cluster registered with Fleet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSelector {
    /// Exact-match labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,

    /// Set-based requirements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<SelectorRequirement>,
}

/// A single set-based selector requirement (`In`, `NotIn`, `Exists`, `DoesNotExist`)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectorRequirement {
    /// Label key the requirement applies to
    pub key: String,

    /// Operator name
    pub operator: String,

    /// Values for `In` / `NotIn`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl ClusterSelector {
    /// Selector from exact-match labels only
    pub fn from_labels<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            match_labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            match_expressions: Vec::new(),
        }
    }

    /// True when the selector matches all clusters
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_like_label_selector() {
        let selector = ClusterSelector::from_labels([("kubernetes.io/os", "linux")]);
        let json = serde_json::to_value(&selector).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "matchLabels": { "kubernetes.io/os": "linux" } })
        );
    }

    #[test]
    fn test_empty_selector_round_trips_as_empty_object() {
        let selector = ClusterSelector::default();
        assert!(selector.is_empty());
        assert_eq!(serde_json::to_value(&selector).unwrap(), serde_json::json!({}));

        let parsed: ClusterSelector = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(parsed, selector);
    }
}
