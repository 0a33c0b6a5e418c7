//! Label, finalizer and namespace constants shared by the controllers.
//!
//! These values are part of the wire contract with Fleet: the Fleet
//! agent copies the ownership labels from a Bundle onto every
//! BundleDeployment it produces, and the status aggregator queries them back.

/// Label carrying the name of the Channel that owns a Bundle or BundleDeployment
pub const OWNER_LABEL: &str = "multi.suse.io/owner";

/// Label carrying the lower-case vendor name
pub const VENDOR_LABEL: &str = "multi.suse.io/vendor";

/// Label carrying the release track
pub const CHANNEL_LABEL: &str = "multi.suse.io/channel";

/// Standard label for the name of a higher-level application this one is part of
pub const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";

/// Value for `app.kubernetes.io/part-of` on everything this project creates
pub const PART_OF_VALUE: &str = "rancher-multi-compute";

/// Finalizer attached to every Channel before any Bundle is created for it
pub const CHANNEL_FINALIZER: &str = "channel.multi.suse.io/finalizer";

/// Namespace Fleet reads Bundles from
pub const FLEET_SYSTEM_NAMESPACE: &str = "cattle-fleet-system";
