//! Kubernetes resource watchers.
//!
//! Drives reconciliation with kube_runtime::Controller:
//! - Channels are watched directly
//! - Bundles trigger their owning Channel through owner references
//! - BundleDeployments trigger the Channel named in their owner label, so
//!   downstream readiness changes are picked up before the periodic requeue

use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::probes::ProbeState;
use crate::reconciler::Reconciler;
use crds::labels::OWNER_LABEL;
use crds::{Bundle, BundleDeployment, Channel};
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Shared context handed to every reconciliation
pub struct Context {
    pub reconciler: Reconciler,
    pub metrics: Metrics,
    pub error_requeue: Duration,
}

async fn reconcile(channel: Arc<Channel>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let name = channel.name_any();
    debug!("Reconciling Channel {}", name);

    let started = Instant::now();
    let result = ctx.reconciler.reconcile_channel(&name).await;
    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    ctx.metrics.observe(outcome, started.elapsed());
    result
}

/// Fixed-interval retry; no exponential backoff
fn error_policy(channel: Arc<Channel>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    error!("Reconciliation error for Channel {}: {}", channel.name_any(), error);
    Action::requeue(ctx.error_requeue)
}

/// Maps a BundleDeployment to the Channel named in its owner label
fn owning_channel(deployment: BundleDeployment) -> Option<ObjectRef<Channel>> {
    deployment
        .labels()
        .get(OWNER_LABEL)
        .map(|owner| ObjectRef::new(owner))
}

/// Watches Channels and their Fleet resources until shutdown.
pub struct Watcher {
    context: Arc<Context>,
    channel_api: Api<Channel>,
    bundle_api: Api<Bundle>,
    deployment_api: Api<BundleDeployment>,
    probes: ProbeState,
}

impl Watcher {
    pub fn new(
        context: Arc<Context>,
        channel_api: Api<Channel>,
        bundle_api: Api<Bundle>,
        deployment_api: Api<BundleDeployment>,
        probes: ProbeState,
    ) -> Self {
        Self {
            context,
            channel_api,
            bundle_api,
            deployment_api,
            probes,
        }
    }

    /// Runs the controller; returns once a shutdown signal has drained it.
    pub async fn watch_channels(self) -> Result<(), ControllerError> {
        info!("Starting Channel watcher");

        // Debounce batches bursts of BundleDeployment status updates
        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(5))
            .concurrency(3);

        let controller = Controller::new(self.channel_api, watcher::Config::default())
            .with_config(controller_config)
            .owns(self.bundle_api, watcher::Config::default())
            .watches(self.deployment_api, watcher::Config::default(), owning_channel)
            .shutdown_on_signal();

        self.probes.mark_ready();

        controller
            .run(reconcile, error_policy, self.context)
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => debug!("Reconciled Channel {}", obj.name),
                    Err(e) => error!("Controller error for Channel: {}", e),
                }
            })
            .await;

        info!("Channel watcher stopped");
        Ok(())
    }
}
