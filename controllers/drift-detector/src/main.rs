//! Drift Detector
//!
//! Periodically compares each Channel's declared GPU stack with what runs
//! downstream and flags differences on the Channel status.

mod config;
mod detector;
mod error;
mod reconciler;
mod watcher;

use crate::config::Settings;
use crate::detector::NoDrift;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::Context;
use crds::Channel;
use kube::{Api, Client};
use kube_store::KubeStore;
use std::sync::Arc;
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

    info!("Starting drift detector");

    let settings = Settings::from_env()?;
    info!("  Drift interval: {:?}", settings.drift_interval);

    let client = Client::try_default().await?;
    let reconciler = Reconciler::new(
        Box::new(KubeStore::new(client.clone())),
        Box::new(NoDrift),
        settings.drift_interval,
    );
    let context = Arc::new(Context {
        reconciler,
        error_requeue: settings.error_requeue,
    });

    let api: Api<Channel> = Api::all(client);
    tokio::spawn(watcher::watch_channels(api, context))
        .await
        .map_err(|e| ControllerError::Watch(format!("Drift watcher panicked: {}", e)))??;

    Ok(())
}
