//! Bundle synchronization.
//!
//! One Fleet Bundle per vendor stack, named `rmc-<vendor>-stack` in the
//! Fleet namespace. Creation sets an owner reference to the Channel; updates
//! touch only `spec` and `labels` of the stored object.

use crds::labels::{CHANNEL_LABEL, OWNER_LABEL, PART_OF_LABEL, PART_OF_VALUE, VENDOR_LABEL};
use crds::{Bundle, BundleSpec, BundleTarget, Channel};
use gpu_stack::{Track, Vendor};
use kube::{Resource, ResourceExt};
use kube_store::{Labels, ObjectStore, StoreError};
use tracing::{debug, info};

/// What the synchronizer did to the stored Bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleWrite {
    Created,
    Updated,
    Unchanged,
}

/// Deterministic Bundle name for a vendor
pub fn bundle_name(vendor: Vendor) -> String {
    format!("rmc-{}-stack", vendor)
}

/// Labels every Bundle written for a Channel carries
pub fn desired_labels(owner: &str, vendor: Vendor, track: Track) -> Labels {
    let mut labels = Labels::new();
    labels.insert(PART_OF_LABEL.to_string(), PART_OF_VALUE.to_string());
    labels.insert(VENDOR_LABEL.to_string(), vendor.to_string());
    labels.insert(CHANNEL_LABEL.to_string(), track.to_string());
    labels.insert(OWNER_LABEL.to_string(), owner.to_string());
    labels
}

/// Labels selecting everything owned by a Channel
pub fn owner_selector(owner: &str) -> Labels {
    let mut labels = Labels::new();
    labels.insert(OWNER_LABEL.to_string(), owner.to_string());
    labels
}

/// Creates or updates the Bundle for `channel`'s vendor stack.
///
/// Conflicts from concurrent writers are returned unchanged so the caller can
/// retry the whole pass.
pub async fn upsert(
    store: &dyn ObjectStore,
    namespace: &str,
    channel: &Channel,
    vendor: Vendor,
    track: Track,
    targets: Vec<BundleTarget>,
) -> Result<BundleWrite, StoreError> {
    let owner = channel.name_any();
    let name = bundle_name(vendor);
    let labels = desired_labels(&owner, vendor, track);
    let spec = BundleSpec { targets };

    match store.get_bundle(namespace, &name).await? {
        None => {
            // Cluster-scoped owner: the reference carries no namespace
            let owner_ref = channel.controller_owner_ref(&()).ok_or_else(|| {
                StoreError::InvalidObject(format!("Channel {} has no uid yet", owner))
            })?;

            let mut bundle = Bundle::new(&name, spec);
            bundle.metadata.namespace = Some(namespace.to_string());
            bundle.metadata.labels = Some(labels);
            bundle.metadata.owner_references = Some(vec![owner_ref]);

            store.create_bundle(&bundle).await?;
            info!("Created Bundle {}/{} for Channel {}", namespace, name, owner);
            Ok(BundleWrite::Created)
        }
        Some(mut existing) => {
            if existing.spec == spec && existing.labels() == &labels {
                debug!("Bundle {}/{} already up to date", namespace, name);
                return Ok(BundleWrite::Unchanged);
            }

            existing.spec = spec;
            existing.metadata.labels = Some(labels);
            store.update_bundle(&existing).await?;
            info!("Updated Bundle {}/{} for Channel {}", namespace, name, owner);
            Ok(BundleWrite::Updated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_channel;
    use crds::ClusterSelector;
    use kube_store::{MockObjectStore, StoreOp};

    const NS: &str = "cattle-fleet-system";

    fn targets(env: &str) -> Vec<BundleTarget> {
        vec![BundleTarget {
            cluster_selector: Some(ClusterSelector::from_labels([("env", env)])),
            bundle_deployment_options: None,
        }]
    }

    #[test]
    fn test_bundle_name() {
        assert_eq!(bundle_name(Vendor::Nvidia), "rmc-nvidia-stack");
        assert_eq!(bundle_name(Vendor::Intel), "rmc-intel-stack");
    }

    #[tokio::test]
    async fn test_create_sets_owner_reference_and_labels() {
        let store = MockObjectStore::new();
        let channel = store.add_channel(create_test_channel("gpu", "nvidia", "stable"));

        let write = upsert(&store, NS, &channel, Vendor::Nvidia, Track::Stable, targets("prod")).await.unwrap();
        assert_eq!(write, BundleWrite::Created);

        let bundle = store.bundle(NS, "rmc-nvidia-stack").unwrap();
        assert_eq!(bundle.labels().get(OWNER_LABEL).map(String::as_str), Some("gpu"));
        assert_eq!(bundle.labels().get(VENDOR_LABEL).map(String::as_str), Some("nvidia"));
        assert_eq!(bundle.labels().get(CHANNEL_LABEL).map(String::as_str), Some("stable"));
        assert_eq!(bundle.labels().get(PART_OF_LABEL).map(String::as_str), Some(PART_OF_VALUE));

        let owner_refs = bundle.owner_references();
        assert_eq!(owner_refs.len(), 1);
        assert_eq!(owner_refs[0].kind, "Channel");
        assert_eq!(owner_refs[0].api_version, "multi.suse.io/v1alpha1");
        assert_eq!(owner_refs[0].name, "gpu");
        assert_eq!(Some(owner_refs[0].uid.clone()), channel.metadata.uid);
        assert_eq!(owner_refs[0].controller, Some(true));
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MockObjectStore::new();
        let channel = store.add_channel(create_test_channel("gpu", "nvidia", "stable"));

        upsert(&store, NS, &channel, Vendor::Nvidia, Track::Stable, targets("prod")).await.unwrap();
        let first = store.bundle(NS, "rmc-nvidia-stack").unwrap();

        let write = upsert(&store, NS, &channel, Vendor::Nvidia, Track::Stable, targets("prod")).await.unwrap();
        assert_eq!(write, BundleWrite::Unchanged);
        let second = store.bundle(NS, "rmc-nvidia-stack").unwrap();
        assert_eq!(second.resource_version(), first.resource_version());
        assert_eq!(second.spec, first.spec);
        assert_eq!(store.ops(), vec![StoreOp::CreateBundle(format!("{}/rmc-nvidia-stack", NS))]);
    }

    #[tokio::test]
    async fn test_update_replaces_spec_and_keeps_other_fields() {
        let store = MockObjectStore::new();
        let channel = store.add_channel(create_test_channel("gpu", "nvidia", "stable"));
        upsert(&store, NS, &channel, Vendor::Nvidia, Track::Stable, targets("prod")).await.unwrap();

        // Something else annotates the Bundle in the meantime
        let mut annotated = store.bundle(NS, "rmc-nvidia-stack").unwrap();
        annotated
            .annotations_mut()
            .insert("fleet.cattle.io/commit".to_string(), "abc123".to_string());
        store.update_bundle(&annotated).await.unwrap();

        let write = upsert(&store, NS, &channel, Vendor::Nvidia, Track::Stable, targets("staging")).await.unwrap();
        assert_eq!(write, BundleWrite::Updated);

        let bundle = store.bundle(NS, "rmc-nvidia-stack").unwrap();
        assert_eq!(bundle.spec.targets, targets("staging"));
        assert_eq!(
            bundle.annotations().get("fleet.cattle.io/commit").map(String::as_str),
            Some("abc123")
        );
        assert_eq!(bundle.owner_references().len(), 1);
    }

    #[tokio::test]
    async fn test_conflict_is_surfaced() {
        let store = MockObjectStore::new();
        let channel = store.add_channel(create_test_channel("gpu", "amd", "lts"));
        store.conflict_bundle_writes(1);

        let err = upsert(&store, NS, &channel, Vendor::Amd, Track::Lts, targets("prod")).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(store.bundles().is_empty());
    }
}
