//! MultiComputeConfig CRD
//!
//! Cluster-wide configuration object. The controllers read its
//! `vendorSources` once at startup to override the built-in Helm chart
//! coordinates of each vendor.

use crate::condition::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "multi.suse.io",
    version = "v1alpha1",
    kind = "MultiComputeConfig",
    status = "MultiComputeConfigStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct MultiComputeConfigSpec {
    /// Per-vendor Helm chart overrides, keyed by vendor name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vendor_sources: BTreeMap<String, VendorSourceSpec>,
}

/// Helm chart coordinates of a vendor stack
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VendorSourceSpec {
    /// Helm repository URL
    pub repo: String,

    /// Chart name
    pub chart: String,

    /// Namespace the chart is installed into on downstream clusters
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct MultiComputeConfigStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}
