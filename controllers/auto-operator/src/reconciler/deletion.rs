//! Finalizer-gated teardown of a Channel's Bundles.

use crate::error::ControllerError;
use crate::reconciler::bundle::owner_selector;
use crate::reconciler::Reconciler;
use crds::labels::CHANNEL_FINALIZER;
use crds::Channel;
use kube::ResourceExt;
use tracing::{debug, info};

impl Reconciler {
    /// Deletes every Bundle owned by `channel`, then releases the finalizer.
    ///
    /// Any delete failure returns before the finalizer is touched.
    pub(crate) async fn handle_deletion(&self, mut channel: Channel) -> Result<(), ControllerError> {
        let name = channel.name_any();
        if !channel.has_finalizer(CHANNEL_FINALIZER) {
            debug!("Channel {} is deleting and holds no finalizer", name);
            return Ok(());
        }

        let owned = self
            .store
            .list_bundles(&self.fleet_namespace, &owner_selector(&name))
            .await?;
        for bundle in &owned {
            let bundle_name = bundle.name_any();
            self.store
                .delete_bundle(&self.fleet_namespace, &bundle_name)
                .await?;
            info!("Deleted Bundle {}/{} owned by Channel {}", self.fleet_namespace, bundle_name, name);
        }

        channel.remove_finalizer(CHANNEL_FINALIZER);
        self.store.update_channel(&channel).await?;
        info!("Released finalizer on Channel {} after removing {} Bundle(s)", name, owned.len());
        Ok(())
    }
}
