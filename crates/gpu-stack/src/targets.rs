//! Fleet target mapping.
//!
//! Wraps a Channel's cluster selector and the vendor's Helm parameters into
//! the target list of a Fleet Bundle. Selector syntax is not validated here;
//! Fleet treats an empty selector as "all clusters".

use crate::vendors::{Vendor, VendorSource};
use crate::versions::{Pins, Track};
use crds::{BundleDeploymentOptions, BundleTarget, ClusterSelector, HelmOptions};
use serde_json::json;

/// Builds the Fleet targets for one selector.
///
/// Always a single target today.
pub fn map_targets(selector: &ClusterSelector, options: BundleDeploymentOptions) -> Vec<BundleTarget> {
    vec![BundleTarget {
        cluster_selector: Some(selector.clone()),
        bundle_deployment_options: Some(options),
    }]
}

/// Helm release name, `<vendor>-<track>`
pub fn release_name(vendor: Vendor, track: Track) -> String {
    format!("{}-{}", vendor, track)
}

/// Helm values carrying the pinned image tags
pub fn helm_values(pins: &Pins) -> serde_json::Value {
    json!({
        "image": {
            "operatorTag": pins.operator_tag,
            "runtimeTag": pins.runtime_tag,
        }
    })
}

/// Deployment options for a vendor stack on a track
pub fn deployment_options(
    vendor: Vendor,
    track: Track,
    source: &VendorSource,
    pins: &Pins,
) -> BundleDeploymentOptions {
    BundleDeploymentOptions {
        default_namespace: Some(source.namespace.clone()),
        helm: Some(HelmOptions {
            release_name: Some(release_name(vendor, track)),
            repo: Some(source.repo.clone()),
            chart: Some(source.chart.clone()),
            values: Some(helm_values(pins)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::VendorSources;

    fn pins() -> Pins {
        Pins {
            operator_tag: "v24.9.0".to_string(),
            runtime_tag: "12.4.1".to_string(),
        }
    }

    #[test]
    fn test_map_targets_wraps_selector_and_options() {
        let selector = ClusterSelector::from_labels([("kubernetes.io/os", "linux")]);
        let sources = VendorSources::defaults();
        let options = deployment_options(
            Vendor::Nvidia,
            Track::Stable,
            sources.get(Vendor::Nvidia).unwrap(),
            &pins(),
        );

        let targets = map_targets(&selector, options.clone());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].cluster_selector.as_ref(), Some(&selector));
        assert_eq!(targets[0].bundle_deployment_options.as_ref(), Some(&options));
    }

    #[test]
    fn test_empty_selector_is_passed_through() {
        let targets = map_targets(&ClusterSelector::default(), BundleDeploymentOptions::default());
        assert_eq!(targets.len(), 1);
        assert!(targets[0].cluster_selector.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_deployment_options_use_vendor_source() {
        let sources = VendorSources::defaults();
        let options = deployment_options(Vendor::Amd, Track::Lts, sources.get(Vendor::Amd).unwrap(), &pins());

        assert_eq!(options.default_namespace.as_deref(), Some("rocm-system"));
        let helm = options.helm.unwrap();
        assert_eq!(helm.release_name.as_deref(), Some("amd-lts"));
        assert_eq!(helm.repo.as_deref(), Some("https://rocm.github.io/helm-charts"));
        assert_eq!(helm.chart.as_deref(), Some("rocm-device-plugin"));
        assert_eq!(
            helm.values.unwrap(),
            json!({ "image": { "operatorTag": "v24.9.0", "runtimeTag": "12.4.1" } })
        );
    }
}
