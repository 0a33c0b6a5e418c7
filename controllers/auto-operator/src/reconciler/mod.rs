//! Channel reconciliation.
//!
//! One pass runs these steps in order, each observing the writes of the
//! previous ones:
//!
//! 1. fetch the Channel (absent: nothing to do)
//! 2. deleting: tear down owned Bundles, then release the finalizer
//! 3. attach the finalizer
//! 4. parse the vendor and track, resolve the track's pins
//! 5. look up the vendor's chart source
//! 6. map targets and converge the Bundle
//! 7. aggregate deployment results and write status if it changed
//!
//! Input errors end the pass with a `Failed` status naming the step. Store
//! errors are returned so the watcher retries the pass.
//!
//! - `bundle`: Bundle naming, labels and create-or-update
//! - `status`: BundleDeployment aggregation
//! - `deletion`: finalizer-gated teardown

pub mod bundle;
pub mod deletion;
pub mod status;

use crate::error::ControllerError;
use chrono::Utc;
use crds::labels::CHANNEL_FINALIZER;
use crds::{Channel, ChannelPhase, ChannelStatus, ReadyReason};
use gpu_stack::{targets, Track, Vendor, VendorSources, VersionResolver};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use kube_store::ObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Reconciles Channels into Fleet Bundles.
pub struct Reconciler {
    pub(crate) store: Box<dyn ObjectStore>,
    pub(crate) resolver: Box<dyn VersionResolver>,
    pub(crate) sources: Arc<VendorSources>,
    pub(crate) fleet_namespace: String,
    pub(crate) requeue_interval: Duration,
}

impl Reconciler {
    pub fn new(
        store: Box<dyn ObjectStore>,
        resolver: Box<dyn VersionResolver>,
        sources: Arc<VendorSources>,
        fleet_namespace: impl Into<String>,
        requeue_interval: Duration,
    ) -> Self {
        Self {
            store,
            resolver,
            sources,
            fleet_namespace: fleet_namespace.into(),
            requeue_interval,
        }
    }

    /// Runs one reconciliation pass for the Channel called `name`.
    pub async fn reconcile_channel(&self, name: &str) -> Result<Action, ControllerError> {
        let Some(mut channel) = self.store.get_channel(name).await? else {
            debug!("Channel {} not found, nothing to reconcile", name);
            return Ok(Action::await_change());
        };

        if channel.is_deleting() {
            self.handle_deletion(channel).await?;
            return Ok(Action::await_change());
        }

        if channel.add_finalizer(CHANNEL_FINALIZER) {
            channel = self.store.update_channel(&channel).await?;
            info!("Added finalizer to Channel {}", name);
        }

        let vendor = match channel.spec.vendor.parse::<Vendor>() {
            Ok(vendor) => vendor,
            Err(e) => {
                warn!("Channel {}: {}", name, e);
                self.record_failure(&channel, ReadyReason::InvalidVendor, e.to_string())
                    .await?;
                return Ok(self.requeue());
            }
        };

        let resolved = match channel.spec.channel.parse::<Track>() {
            Ok(track) => self.resolver.resolve(track).await.map(|pins| (track, pins)),
            Err(e) => Err(e),
        };
        let (track, pins) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(
                    "Channel {}: cannot resolve pins for track {:?}: {}",
                    name, channel.spec.channel, e
                );
                self.record_failure(&channel, ReadyReason::VersionResolutionError, e.to_string())
                    .await?;
                return Ok(self.requeue());
            }
        };
        let pins = pins.for_vendor(vendor);

        let Some(source) = self.sources.get(vendor) else {
            warn!("Channel {}: no chart source configured for {}", name, vendor);
            self.record_failure(
                &channel,
                ReadyReason::MissingVendorSource,
                format!("no chart source configured for vendor {}", vendor),
            )
            .await?;
            return Ok(self.requeue());
        };

        let options = targets::deployment_options(vendor, track, source, pins);
        let fleet_targets = targets::map_targets(&channel.spec.cluster_selector, options);

        match bundle::upsert(
            self.store.as_ref(),
            &self.fleet_namespace,
            &channel,
            vendor,
            track,
            fleet_targets,
        )
        .await
        {
            Ok(write) => debug!("Channel {}: Bundle {:?}", name, write),
            Err(e) if e.is_conflict() => return Err(e.into()),
            Err(e) => {
                error!("Channel {}: failed to converge Bundle: {}", name, e);
                self.record_failure(&channel, ReadyReason::BundleCreationError, e.to_string())
                    .await?;
                return Ok(self.requeue());
            }
        }

        let phase = match status::summarize(self.store.as_ref(), name, vendor).await {
            Ok(phase) => phase,
            Err(e) => {
                error!("Channel {}: failed to list deployments: {}", name, e);
                self.record(
                    &channel,
                    ChannelPhase::Pending,
                    ReadyReason::DeploymentListError,
                    e.to_string(),
                )
                .await?;
                return Err(e.into());
            }
        };

        let version = pins.version_string();
        let mut new_status = channel.status.clone().unwrap_or_default();
        let version_changed = new_status.observe_version(&version);
        let phase_changed = new_status.record(
            phase,
            ReadyReason::Reconciled,
            format!("{} {} on track {}", vendor, version, track),
            Utc::now(),
        );
        if version_changed || phase_changed {
            self.write_status(&channel, new_status).await?;
            info!("Channel {} is {} at {}", name, phase, version);
        } else {
            debug!("Channel {} unchanged ({} at {})", name, phase, version);
        }

        Ok(self.requeue())
    }

    fn requeue(&self) -> Action {
        Action::requeue(self.requeue_interval)
    }

    async fn record_failure(
        &self,
        channel: &Channel,
        reason: ReadyReason,
        message: String,
    ) -> Result<(), ControllerError> {
        self.record(channel, ChannelPhase::Failed, reason, message).await
    }

    /// Records a phase with its Ready condition, keeping the observed version.
    async fn record(
        &self,
        channel: &Channel,
        phase: ChannelPhase,
        reason: ReadyReason,
        message: String,
    ) -> Result<(), ControllerError> {
        let mut new_status = channel.status.clone().unwrap_or_default();
        if new_status.record(phase, reason, message, Utc::now()) {
            self.write_status(channel, new_status).await?;
            info!("Channel {} is {} ({})", channel.name_any(), phase, reason);
        }
        Ok(())
    }

    async fn write_status(&self, channel: &Channel, status: ChannelStatus) -> Result<(), ControllerError> {
        let mut updated = channel.clone();
        updated.status = Some(status);
        self.store.update_channel_status(&updated).await?;
        Ok(())
    }
}
