//! Test utilities for unit testing reconcilers
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use crate::reconciler::Reconciler;
use crds::labels::{OWNER_LABEL, VENDOR_LABEL};
use crds::{
    BundleDeployment, BundleDeploymentDisplay, BundleDeploymentSpec, BundleDeploymentStatus,
    Channel, ChannelSpec, ClusterSelector,
};
use gpu_stack::{Pins, StaticResolver, Track, Vendor, VendorPins, VendorSources};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube_store::MockObjectStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const FLEET_NS: &str = "cattle-fleet-system";

/// Helper to create test Channel CRD
pub fn create_test_channel(name: &str, vendor: &str, track: &str) -> Channel {
    Channel::new(
        name,
        ChannelSpec {
            vendor: vendor.to_string(),
            channel: track.to_string(),
            cluster_selector: ClusterSelector::from_labels([("kubernetes.io/os", "linux")]),
        },
    )
}

/// Helper to create a BundleDeployment as Fleet would report it
pub fn create_test_bundle_deployment(
    name: &str,
    owner: &str,
    vendor: Vendor,
    ready: bool,
    state: Option<&str>,
) -> BundleDeployment {
    let mut labels = BTreeMap::new();
    labels.insert(OWNER_LABEL.to_string(), owner.to_string());
    labels.insert(VENDOR_LABEL.to_string(), vendor.to_string());
    BundleDeployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("cluster-fleet-default-c1".to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: BundleDeploymentSpec::default(),
        status: Some(BundleDeploymentStatus {
            ready,
            display: state.map(|s| BundleDeploymentDisplay {
                state: Some(s.to_string()),
            }),
        }),
    }
}

fn pins(operator_tag: &str, runtime_tag: &str) -> Pins {
    Pins {
        operator_tag: operator_tag.to_string(),
        runtime_tag: runtime_tag.to_string(),
    }
}

/// Pins for the `stable` track
pub fn stable_pins() -> VendorPins {
    VendorPins {
        nvidia: pins("v24.9.0", "12.4.1"),
        amd: pins("v1.2.0", "6.1.3"),
        intel: pins("v0.30.0", "24.16.0"),
    }
}

/// Pins for the `lts` track
pub fn lts_pins() -> VendorPins {
    VendorPins {
        nvidia: pins("v23.9.2", "12.2.2"),
        amd: pins("v1.1.0", "6.0.2"),
        intel: pins("v0.29.0", "23.43.0"),
    }
}

/// Reconciler over a mock store, with `stable` and `lts` pins and default sources
pub fn create_test_reconciler(store: &MockObjectStore) -> Reconciler {
    create_test_reconciler_with_sources(store, VendorSources::defaults())
}

pub fn create_test_reconciler_with_sources(store: &MockObjectStore, sources: VendorSources) -> Reconciler {
    let resolver = StaticResolver::new()
        .with_track(Track::Stable, stable_pins())
        .with_track(Track::Lts, lts_pins());
    Reconciler::new(
        Box::new(store.clone()),
        Box::new(resolver),
        Arc::new(sources),
        FLEET_NS,
        Duration::from_secs(300),
    )
}
