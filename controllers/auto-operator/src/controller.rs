//! Main controller implementation.
//!
//! Builds the reconciler from the settings (object store, pin source, vendor
//! sources), then runs the Channel watcher next to the probe server.

use crate::config::Settings;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::probes::{self, ProbeState};
use crate::reconciler::Reconciler;
use crate::watcher::{Context, Watcher};
use crds::{Bundle, BundleDeployment, Channel, MultiComputeConfig};
use gpu_stack::{ConfigMapResolver, FileResolver, VendorSources, VersionResolver};
use kube::{Api, Client};
use kube_store::KubeStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Main controller for Channel resources.
pub struct Controller {
    channel_watcher: JoinHandle<Result<(), ControllerError>>,
    probe_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its tasks.
    pub async fn new(settings: Settings) -> Result<Self, ControllerError> {
        info!("Initializing auto-operator controller");

        let client = Client::try_default().await?;

        let resolver: Box<dyn VersionResolver> = match &settings.versions_configmap {
            Some(name) => {
                info!("Reading version pins from ConfigMap {}/{}", settings.pod_namespace, name);
                Box::new(ConfigMapResolver::new(client.clone(), &settings.pod_namespace, name.clone()))
            }
            None => {
                info!("Reading version pins from {}", settings.version_dir.display());
                Box::new(FileResolver::new(settings.version_dir.clone()))
            }
        };

        let sources = Arc::new(load_vendor_sources(&client, &settings).await?);
        info!("Loaded chart sources for {} vendor(s)", sources.len());

        let reconciler = Reconciler::new(
            Box::new(KubeStore::new(client.clone())),
            resolver,
            sources,
            settings.fleet_namespace.clone(),
            settings.requeue_interval,
        );

        let metrics = Metrics::new()?;
        let probes = ProbeState::new(metrics.clone());
        let context = Arc::new(Context {
            reconciler,
            metrics,
            error_requeue: settings.error_requeue,
        });

        let watcher = Watcher::new(
            context,
            Api::<Channel>::all(client.clone()),
            Api::<Bundle>::namespaced(client.clone(), &settings.fleet_namespace),
            Api::<BundleDeployment>::all(client),
            probes.clone(),
        );

        let channel_watcher = tokio::spawn(async move { watcher.watch_channels().await });

        let probe_addr = settings.probe_addr;
        let probe_server = tokio::spawn(async move { probes::serve(probe_addr, probes).await });

        Ok(Self {
            channel_watcher,
            probe_server,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("auto-operator controller running");

        // The watcher returns on SIGTERM/SIGINT; the probe server only on failure
        tokio::select! {
            result = &mut self.channel_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Channel watcher panicked: {}", e)))??;
            }
            result = &mut self.probe_server => {
                result.map_err(|e| ControllerError::Watch(format!("Probe server panicked: {}", e)))??;
            }
        }

        self.probe_server.abort();
        Ok(())
    }
}

/// Built-in defaults, then the optional file, then the MultiComputeConfig.
async fn load_vendor_sources(client: &Client, settings: &Settings) -> Result<VendorSources, ControllerError> {
    let mut sources = VendorSources::defaults();

    if let Some(path) = &settings.vendor_sources_file {
        let data = tokio::fs::read_to_string(path).await?;
        let applied = sources.overlay_yaml(&data, &path.display().to_string())?;
        info!("Applied {} vendor source override(s) from {}", applied, path.display());
    }

    let api: Api<MultiComputeConfig> = Api::all(client.clone());
    match api.get_opt(&settings.multi_compute_config).await {
        Ok(Some(config)) => {
            let applied = sources.overlay_config(&config);
            info!(
                "Applied {} vendor source override(s) from MultiComputeConfig {}",
                applied, settings.multi_compute_config
            );
        }
        Ok(None) => debug!("MultiComputeConfig {} not found", settings.multi_compute_config),
        Err(e) => warn!(
            "Cannot read MultiComputeConfig {} (continuing with current sources): {}",
            settings.multi_compute_config, e
        ),
    }

    Ok(sources)
}
