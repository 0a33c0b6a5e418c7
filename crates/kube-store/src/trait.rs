//! ObjectStore trait for mocking
//!
//! This trait abstracts the API server so reconcilers can be unit tested
//! against an in-memory store. All async methods must be `Send` to work with
//! Tokio's work-stealing runtime.

use crate::error::StoreError;
use crds::{Bundle, BundleDeployment, Channel};
use std::collections::BTreeMap;

/// Exact-match label set used for list queries
pub type Labels = BTreeMap<String, String>;

/// Renders labels as a Kubernetes label selector (`k1=v1,k2=v2`)
pub fn label_selector(labels: &Labels) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Store operations used by the reconcilers
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    // Channels (cluster-scoped)

    /// Fetches a Channel; `None` when it does not exist
    async fn get_channel(&self, name: &str) -> Result<Option<Channel>, StoreError>;

    /// Persists the Channel's metadata (finalizers), guarded by its resourceVersion
    async fn update_channel(&self, channel: &Channel) -> Result<Channel, StoreError>;

    /// Persists the Channel's status subresource, guarded by its resourceVersion
    async fn update_channel_status(&self, channel: &Channel) -> Result<Channel, StoreError>;

    // Fleet Bundles

    async fn get_bundle(&self, namespace: &str, name: &str) -> Result<Option<Bundle>, StoreError>;
    async fn list_bundles(&self, namespace: &str, labels: &Labels) -> Result<Vec<Bundle>, StoreError>;
    async fn create_bundle(&self, bundle: &Bundle) -> Result<Bundle, StoreError>;

    /// Replaces a Bundle, guarded by its resourceVersion
    async fn update_bundle(&self, bundle: &Bundle) -> Result<Bundle, StoreError>;

    /// Deletes a Bundle; an already-absent Bundle is not an error
    async fn delete_bundle(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    // Fleet BundleDeployments (read-only, all namespaces)

    async fn list_bundle_deployments(&self, labels: &Labels) -> Result<Vec<BundleDeployment>, StoreError>;
}
