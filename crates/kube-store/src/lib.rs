//! Object store access for the multi-compute controllers
//!
//! Reconcilers talk to the cluster only through [`ObjectStore`], a small
//! get/list/create/update/delete surface over Channels, Fleet Bundles and
//! Fleet BundleDeployments. Two implementations exist:
//!
//! - [`KubeStore`]: backed by kube-rs against a live API server
//! - `MockObjectStore` (feature `test-util`): in-memory, with the same
//!   optimistic-concurrency and finalizer semantics, for unit tests
//!
//! Updates carry the object's `resourceVersion`; a stale write fails with
//! [`StoreError::Conflict`] and the caller retries the whole pass.

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeStore;
pub use error::StoreError;
pub use store_trait::{label_selector, Labels, ObjectStore};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockObjectStore, StoreOp};
