//! GPU vendors and their Helm chart sources.
//!
//! Vendor names arrive as free-form strings on the Channel spec and are
//! parsed into the closed [`Vendor`] enum before anything else happens.

use crate::error::VendorError;
use crds::MultiComputeConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub use crds::VendorSourceSpec as VendorSource;

/// Supported GPU vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Nvidia,
    Amd,
    Intel,
}

impl Vendor {
    /// Every supported vendor
    pub const ALL: [Vendor; 3] = [Vendor::Nvidia, Vendor::Amd, Vendor::Intel];

    /// Lower-case name used in labels, resource names and pin files
    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::Nvidia => "nvidia",
            Vendor::Amd => "amd",
            Vendor::Intel => "intel",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = VendorError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nvidia" => Ok(Vendor::Nvidia),
            "amd" => Ok(Vendor::Amd),
            "intel" => Ok(Vendor::Intel),
            _ => Err(VendorError::Unsupported(s.to_string())),
        }
    }
}

/// Helm chart coordinates per vendor.
///
/// Built once at startup and shared read-only by every reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorSources {
    sources: BTreeMap<Vendor, VendorSource>,
}

impl VendorSources {
    /// Upstream charts for every supported vendor
    pub fn defaults() -> Self {
        let mut sources = Self::default();
        sources.insert(
            Vendor::Nvidia,
            source("https://nvidia.github.io/helm-charts", "gpu-operator", "gpu-operator"),
        );
        sources.insert(
            Vendor::Amd,
            source("https://rocm.github.io/helm-charts", "rocm-device-plugin", "rocm-system"),
        );
        sources.insert(
            Vendor::Intel,
            source("https://intel.github.io/helm-charts", "intel-gpu-plugin", "intel-gpu"),
        );
        sources
    }

    /// Chart source for `vendor`, if configured
    pub fn get(&self, vendor: Vendor) -> Option<&VendorSource> {
        self.sources.get(&vendor)
    }

    /// Sets or replaces the source for `vendor`
    pub fn insert(&mut self, vendor: Vendor, source: VendorSource) {
        self.sources.insert(vendor, source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Applies overrides keyed by vendor name.
    ///
    /// Keys that do not name a supported vendor are logged and skipped.
    /// Returns the number of entries applied.
    pub fn overlay<I>(&mut self, entries: I, origin: &str) -> usize
    where
        I: IntoIterator<Item = (String, VendorSource)>,
    {
        let mut applied = 0;
        for (key, source) in entries {
            match key.parse::<Vendor>() {
                Ok(vendor) => {
                    debug!("Vendor source for {} overridden by {}", vendor, origin);
                    self.insert(vendor, source);
                    applied += 1;
                }
                Err(e) => warn!("Ignoring vendor source from {}: {}", origin, e),
            }
        }
        applied
    }

    /// Applies a YAML mapping `vendor -> {repo, chart, namespace}`.
    pub fn overlay_yaml(&mut self, yaml: &str, origin: &str) -> Result<usize, VendorError> {
        let entries: BTreeMap<String, VendorSource> = serde_yaml::from_str(yaml)
            .map_err(|e| VendorError::Malformed(format!("{}: {}", origin, e)))?;
        Ok(self.overlay(entries, origin))
    }

    /// Applies the `vendorSources` of a MultiComputeConfig.
    pub fn overlay_config(&mut self, config: &MultiComputeConfig) -> usize {
        let origin = format!(
            "MultiComputeConfig {}",
            config.metadata.name.as_deref().unwrap_or("<unknown>")
        );
        self.overlay(config.spec.vendor_sources.clone(), &origin)
    }
}

fn source(repo: &str, chart: &str, namespace: &str) -> VendorSource {
    VendorSource {
        repo: repo.to_string(),
        chart: chart.to_string(),
        namespace: namespace.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::MultiComputeConfigSpec;

    #[test]
    fn test_parse_vendor_case_insensitive() {
        assert_eq!("nvidia".parse::<Vendor>().unwrap(), Vendor::Nvidia);
        assert_eq!("AMD".parse::<Vendor>().unwrap(), Vendor::Amd);
        assert_eq!(" Intel ".parse::<Vendor>().unwrap(), Vendor::Intel);
    }

    #[test]
    fn test_parse_unsupported_vendor() {
        let err = "unsupported".parse::<Vendor>().unwrap_err();
        assert!(matches!(err, VendorError::Unsupported(ref v) if v == "unsupported"));
        assert!("".parse::<Vendor>().is_err());
    }

    #[test]
    fn test_defaults_cover_every_vendor() {
        let sources = VendorSources::defaults();
        for vendor in Vendor::ALL {
            let source = sources.get(vendor).unwrap();
            assert!(!source.repo.is_empty());
            assert!(!source.chart.is_empty());
            assert!(!source.namespace.is_empty());
        }
        assert_eq!(sources.get(Vendor::Nvidia).unwrap().chart, "gpu-operator");
    }

    #[test]
    fn test_overlay_yaml_skips_unknown_vendor() {
        let mut sources = VendorSources::defaults();
        let applied = sources
            .overlay_yaml(
                r#"
nvidia:
  repo: https://mirror.example.com/charts
  chart: gpu-operator
  namespace: nvidia-system
matrox:
  repo: https://example.com
  chart: none
  namespace: none
"#,
                "test",
            )
            .unwrap();
        assert_eq!(applied, 1);
        assert_eq!(sources.len(), 3);
        let nvidia = sources.get(Vendor::Nvidia).unwrap();
        assert_eq!(nvidia.repo, "https://mirror.example.com/charts");
        assert_eq!(nvidia.namespace, "nvidia-system");
    }

    #[test]
    fn test_overlay_yaml_rejects_bad_shape() {
        let mut sources = VendorSources::default();
        let err = sources.overlay_yaml("nvidia: [1, 2]", "test").unwrap_err();
        assert!(matches!(err, VendorError::Malformed(_)));
        assert!(sources.is_empty());
    }

    #[test]
    fn test_overlay_from_config() {
        let mut spec = MultiComputeConfigSpec::default();
        spec.vendor_sources.insert(
            "amd".to_string(),
            source("https://internal/charts", "amd-gpu", "amd-gpu"),
        );
        let config = MultiComputeConfig::new("default", spec);

        let mut sources = VendorSources::defaults();
        assert_eq!(sources.overlay_config(&config), 1);
        assert_eq!(sources.get(Vendor::Amd).unwrap().chart, "amd-gpu");
        assert_eq!(sources.get(Vendor::Intel).unwrap().chart, "intel-gpu-plugin");
    }
}
