//! Auto-Operator Controller
//!
//! Converges every Channel (GPU vendor + release track + cluster selector)
//! into a Fleet Bundle carrying the vendor's Helm chart with pinned image
//! tags, and reports the aggregated rollout of the resulting
//! BundleDeployments back on the Channel status.

mod config;
mod controller;
mod error;
mod metrics;
mod probes;
mod reconciler;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::Settings;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A rustls crypto provider was already installed");
    }

    info!("Starting auto-operator controller");

    let settings = Settings::from_env()?;
    info!("Configuration:");
    info!("  Fleet namespace: {}", settings.fleet_namespace);
    match &settings.versions_configmap {
        Some(name) => info!("  Version pins: ConfigMap {}/{}", settings.pod_namespace, name),
        None => info!("  Version pins: {}", settings.version_dir.display()),
    }
    info!("  Requeue interval: {:?}", settings.requeue_interval);
    info!("  Probe address: {}", settings.probe_addr);

    let controller = Controller::new(settings).await?;
    controller.run().await?;

    Ok(())
}
