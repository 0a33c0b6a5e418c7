//! GPU stack resolution
//!
//! Turns a Channel's abstract intent into concrete deployment parameters:
//!
//! - [`versions`]: closed track set, release track -> pinned operator/runtime tags per vendor
//! - [`vendors`]: closed vendor set and per-vendor Helm chart coordinates
//! - [`targets`]: cluster selector + Helm options -> Fleet targets
//!
//! # Example
//!
//! ```no_run
//! use gpu_stack::{FileResolver, Track, Vendor, VendorSources, VersionResolver, targets};
//! use crds::ClusterSelector;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = FileResolver::new("/etc/rmc/versions");
//! let track: Track = "stable".parse()?;
//! let pins = resolver.resolve(track).await?;
//!
//! let vendor: Vendor = "nvidia".parse()?;
//! let sources = VendorSources::defaults();
//! let source = sources.get(vendor).ok_or("no source")?;
//!
//! let options = targets::deployment_options(vendor, track, source, pins.for_vendor(vendor));
//! let fleet_targets = targets::map_targets(&ClusterSelector::default(), options);
//! assert_eq!(fleet_targets.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod targets;
pub mod vendors;
pub mod versions;

pub use error::{VendorError, VersionError};
pub use vendors::{Vendor, VendorSource, VendorSources};
pub use versions::{
    ConfigMapResolver, FileResolver, Pins, StaticResolver, Track, VendorPins, VersionResolver,
};
