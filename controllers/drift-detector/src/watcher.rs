//! Channel watcher for the drift detector.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crds::Channel;
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

pub struct Context {
    pub reconciler: Reconciler,
    pub error_requeue: Duration,
}

async fn reconcile(channel: Arc<Channel>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    ctx.reconciler.reconcile_channel(&channel.name_any()).await
}

fn error_policy(channel: Arc<Channel>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    error!("Drift check failed for Channel {}: {}", channel.name_any(), error);
    Action::requeue(ctx.error_requeue)
}

/// Runs the drift controller until a shutdown signal arrives.
pub async fn watch_channels(api: Api<Channel>, context: Arc<Context>) -> Result<(), ControllerError> {
    info!("Starting drift watcher");

    Controller::new(api, watcher::Config::default())
        .with_config(ControllerConfig::default().concurrency(3))
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!("Checked Channel {}", obj.name),
                Err(e) => error!("Drift controller error: {}", e),
            }
        })
        .await;

    info!("Drift watcher stopped");
    Ok(())
}
