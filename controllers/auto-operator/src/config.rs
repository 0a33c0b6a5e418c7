//! Controller configuration.
//!
//! Read once from the environment at startup. Parsing goes through a lookup
//! closure so it can be exercised without touching the process environment.

use crate::error::ControllerError;
use crds::labels::FLEET_SYSTEM_NAMESPACE;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_VERSION_DIR: &str = "/etc/rmc/versions";
const DEFAULT_POD_NAMESPACE: &str = "rmc-system";
const DEFAULT_MULTI_COMPUTE_CONFIG: &str = "default";
const DEFAULT_REQUEUE_SECS: u64 = 300;
const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;
const DEFAULT_PROBE_ADDR: &str = "0.0.0.0:8080";

/// Immutable controller settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Namespace Bundles are written to
    pub fleet_namespace: String,
    /// Root of the `<track>/VERSION.yaml` pin files
    pub version_dir: PathBuf,
    /// When set, pins come from this ConfigMap instead of files
    pub versions_configmap: Option<String>,
    /// Namespace holding the versions ConfigMap
    pub pod_namespace: String,
    /// Optional YAML file overriding vendor sources
    pub vendor_sources_file: Option<PathBuf>,
    /// Name of the MultiComputeConfig read at startup
    pub multi_compute_config: String,
    /// Requeue after a completed pass
    pub requeue_interval: Duration,
    /// Requeue after a transient error
    pub error_requeue: Duration,
    /// Listener for /healthz, /readyz and /metrics
    pub probe_addr: SocketAddr,
}

impl Settings {
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            fleet_namespace: get("FLEET_NAMESPACE").unwrap_or_else(|| FLEET_SYSTEM_NAMESPACE.to_string()),
            version_dir: get("VERSION_DIR")
                .unwrap_or_else(|| DEFAULT_VERSION_DIR.to_string())
                .into(),
            versions_configmap: get("VERSIONS_CONFIGMAP"),
            pod_namespace: get("POD_NAMESPACE").unwrap_or_else(|| DEFAULT_POD_NAMESPACE.to_string()),
            vendor_sources_file: get("VENDOR_SOURCES_FILE").map(PathBuf::from),
            multi_compute_config: get("MULTI_COMPUTE_CONFIG")
                .unwrap_or_else(|| DEFAULT_MULTI_COMPUTE_CONFIG.to_string()),
            requeue_interval: seconds("REQUEUE_INTERVAL_SECS", get("REQUEUE_INTERVAL_SECS"), DEFAULT_REQUEUE_SECS)?,
            error_requeue: seconds("ERROR_REQUEUE_SECS", get("ERROR_REQUEUE_SECS"), DEFAULT_ERROR_REQUEUE_SECS)?,
            probe_addr: match get("PROBE_ADDR") {
                Some(v) => parse("PROBE_ADDR", &v)?,
                None => parse("PROBE_ADDR", DEFAULT_PROBE_ADDR)?,
            },
        })
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ControllerError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ControllerError::InvalidConfig(format!("{}={:?}: {}", key, value, e)))
}

/// Positive number of seconds
fn seconds(key: &str, value: Option<String>, default: u64) -> Result<Duration, ControllerError> {
    let secs = match value {
        Some(v) => parse(key, &v)?,
        None => default,
    };
    if secs == 0 {
        return Err(ControllerError::InvalidConfig(format!("{} must be greater than zero", key)));
    }
    Ok(Duration::from_secs(secs))
}
