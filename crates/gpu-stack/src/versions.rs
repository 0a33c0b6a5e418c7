//! Version pin resolution.
//!
//! Every release track has one record holding an `{operatorTag, runtimeTag}`
//! pair per vendor:
//!
//! ```yaml
//! nvidia:
//!   operatorTag: "v24.9.0"
//!   runtimeTag: "12.4.1"
//! amd:
//!   operatorTag: "v1.2.0"
//!   runtimeTag: "6.1.3"
//! intel:
//!   operatorTag: "v0.30.0"
//!   runtimeTag: "24.16.0"
//! ```
//!
//! Resolvers only read; retry policy is left to the reconciliation cadence.

use crate::error::VersionError;
use crate::vendors::Vendor;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::Api;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// File name holding the pins inside each track directory
pub const VERSION_FILE: &str = "VERSION.yaml";

/// Supported release tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Stable,
    Lts,
    Canary,
}

impl Track {
    /// Every supported track
    pub const ALL: [Track; 3] = [Track::Stable, Track::Lts, Track::Canary];

    /// Name used in pin paths, labels and release names
    pub fn as_str(self) -> &'static str {
        match self {
            Track::Stable => "stable",
            Track::Lts => "lts",
            Track::Canary => "canary",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = VersionError;

    /// Exact match only; anything else is `InvalidTrack`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(Track::Stable),
            "lts" => Ok(Track::Lts),
            "canary" => Ok(Track::Canary),
            _ => Err(VersionError::InvalidTrack(s.to_string())),
        }
    }
}

/// Pinned tags for one vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pins {
    /// Image tag of the vendor's operator
    pub operator_tag: String,
    /// Image tag of the driver / runtime stack
    pub runtime_tag: String,
}

impl Pins {
    /// "<operatorTag>/<runtimeTag>", as reported in `status.observedVersion`
    pub fn version_string(&self) -> String {
        format!("{}/{}", self.operator_tag, self.runtime_tag)
    }
}

/// Pinned tags for every vendor on one track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPins {
    pub nvidia: Pins,
    pub amd: Pins,
    pub intel: Pins,
}

impl VendorPins {
    /// Pins of one vendor
    pub fn for_vendor(&self, vendor: Vendor) -> &Pins {
        match vendor {
            Vendor::Nvidia => &self.nvidia,
            Vendor::Amd => &self.amd,
            Vendor::Intel => &self.intel,
        }
    }

    /// Parses and validates a pin record.
    ///
    /// Missing vendors, missing fields and empty tags are all `Malformed`.
    pub fn parse(track: Track, yaml: &str) -> Result<Self, VersionError> {
        let pins: VendorPins = serde_yaml::from_str(yaml).map_err(|e| VersionError::Malformed {
            track: track.to_string(),
            reason: e.to_string(),
        })?;
        for vendor in Vendor::ALL {
            let p = pins.for_vendor(vendor);
            if p.operator_tag.trim().is_empty() || p.runtime_tag.trim().is_empty() {
                return Err(VersionError::Malformed {
                    track: track.to_string(),
                    reason: format!("empty tag for {}", vendor),
                });
            }
        }
        Ok(pins)
    }
}

/// Resolves a release track to its pins.
#[async_trait]
pub trait VersionResolver: Send + Sync {
    async fn resolve(&self, track: Track) -> Result<VendorPins, VersionError>;
}

/// Reads `<version_dir>/<track>/VERSION.yaml`.
#[derive(Debug, Clone)]
pub struct FileResolver {
    version_dir: PathBuf,
}

impl FileResolver {
    pub fn new(version_dir: impl Into<PathBuf>) -> Self {
        Self {
            version_dir: version_dir.into(),
        }
    }

    pub fn version_dir(&self) -> &Path {
        &self.version_dir
    }

    fn path_for(&self, track: Track) -> PathBuf {
        self.version_dir.join(track.as_str()).join(VERSION_FILE)
    }
}

#[async_trait]
impl VersionResolver for FileResolver {
    async fn resolve(&self, track: Track) -> Result<VendorPins, VersionError> {
        let path = self.path_for(track);
        debug!("Reading version pins from {}", path.display());

        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VersionError::NotFound(track.to_string()));
            }
            Err(e) => return Err(VersionError::Io { path, source: e }),
        };
        VendorPins::parse(track, &data)
    }
}

/// Reads pins from a ConfigMap whose data keys are track names.
#[derive(Clone)]
pub struct ConfigMapResolver {
    api: Api<ConfigMap>,
    name: String,
}

impl ConfigMapResolver {
    pub fn new(client: kube::Client, namespace: &str, name: impl Into<String>) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            name: name.into(),
        }
    }
}

#[async_trait]
impl VersionResolver for ConfigMapResolver {
    async fn resolve(&self, track: Track) -> Result<VendorPins, VersionError> {
        debug!("Reading version pins for {} from ConfigMap {}", track, self.name);

        let Some(config_map) = self.api.get_opt(&self.name).await? else {
            return Err(VersionError::NotFound(track.to_string()));
        };
        let data = config_map
            .data
            .as_ref()
            .and_then(|d| d.get(track.as_str()))
            .ok_or_else(|| VersionError::NotFound(track.to_string()))?;
        VendorPins::parse(track, data)
    }
}

/// In-memory resolver over a fixed map of tracks.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    tracks: HashMap<Track, VendorPins>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the pins for a track
    pub fn with_track(mut self, track: Track, pins: VendorPins) -> Self {
        self.tracks.insert(track, pins);
        self
    }
}

#[async_trait]
impl VersionResolver for StaticResolver {
    async fn resolve(&self, track: Track) -> Result<VendorPins, VersionError> {
        self.tracks
            .get(&track)
            .cloned()
            .ok_or_else(|| VersionError::NotFound(track.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STABLE: &str = r#"
nvidia:
  operatorTag: "v24.9.0"
  runtimeTag: "12.4.1"
amd:
  operatorTag: "v1.2.0"
  runtimeTag: "6.1.3"
intel:
  operatorTag: "v0.30.0"
  runtimeTag: "24.16.0"
"#;

    fn write_track(dir: &Path, track: &str, contents: &str) {
        let track_dir = dir.join(track);
        std::fs::create_dir_all(&track_dir).unwrap();
        std::fs::write(track_dir.join(VERSION_FILE), contents).unwrap();
    }

    #[tokio::test]
    async fn test_file_resolver_reads_every_vendor() {
        let dir = tempfile::tempdir().unwrap();
        write_track(dir.path(), "stable", STABLE);

        let pins = FileResolver::new(dir.path()).resolve(Track::Stable).await.unwrap();
        for vendor in Vendor::ALL {
            let p = pins.for_vendor(vendor);
            assert!(!p.operator_tag.is_empty(), "{} operator tag", vendor);
            assert!(!p.runtime_tag.is_empty(), "{} runtime tag", vendor);
        }
        assert_eq!(pins.nvidia.version_string(), "v24.9.0/12.4.1");
        assert_eq!(pins.intel.runtime_tag, "24.16.0");
    }

    #[tokio::test]
    async fn test_file_resolver_missing_track() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileResolver::new(dir.path()).resolve(Track::Canary).await.unwrap_err();
        assert!(matches!(err, VersionError::NotFound(ref t) if t == "canary"));
    }

    #[tokio::test]
    async fn test_file_resolver_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        write_track(dir.path(), "lts", "nvidia: [not, a, map]\n");
        let err = FileResolver::new(dir.path()).resolve(Track::Lts).await.unwrap_err();
        assert!(matches!(err, VersionError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_file_resolver_missing_vendor_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write_track(
            dir.path(),
            "lts",
            "nvidia:\n  operatorTag: v1\n  runtimeTag: r1\n",
        );
        let err = FileResolver::new(dir.path()).resolve(Track::Lts).await.unwrap_err();
        assert!(matches!(err, VersionError::Malformed { .. }));
    }

    #[test]
    fn test_parse_track() {
        for track in Track::ALL {
            assert_eq!(track.as_str().parse::<Track>().unwrap(), track);
        }
        for bad in ["", "  ", "Stable", "nightly", "../elsewhere", "stable/../lts"] {
            let err = bad.parse::<Track>().unwrap_err();
            assert!(matches!(err, VersionError::InvalidTrack(ref t) if t == bad), "{:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_file_resolver_stays_inside_version_dir() {
        let root = tempfile::tempdir().unwrap();
        let versions = root.path().join("versions");
        std::fs::create_dir_all(&versions).unwrap();
        write_track(root.path(), "elsewhere", STABLE);

        // A track that escapes the directory never reaches the resolver
        assert!("../elsewhere".parse::<Track>().is_err());

        let resolver = FileResolver::new(&versions);
        for track in Track::ALL {
            assert!(resolver.path_for(track).starts_with(&versions));
            assert!(matches!(
                resolver.resolve(track).await.unwrap_err(),
                VersionError::NotFound(_)
            ));
        }
    }

    #[test]
    fn test_parse_rejects_empty_tags() {
        let yaml = STABLE.replace("\"6.1.3\"", "\"\"");
        let err = VendorPins::parse(Track::Stable, &yaml).unwrap_err();
        assert!(matches!(err, VersionError::Malformed { ref reason, .. } if reason.contains("amd")));
    }

    #[tokio::test]
    async fn test_static_resolver() {
        let pins = VendorPins::parse(Track::Stable, STABLE).unwrap();
        let resolver = StaticResolver::new().with_track(Track::Stable, pins.clone());
        assert_eq!(resolver.resolve(Track::Stable).await.unwrap(), pins);
        assert!(matches!(
            resolver.resolve(Track::Canary).await.unwrap_err(),
            VersionError::NotFound(_)
        ));
    }
}
