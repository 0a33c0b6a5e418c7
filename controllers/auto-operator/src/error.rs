//! Controller-specific error types.

use gpu_stack::{VendorError, VersionError};
use kube_store::StoreError;
use thiserror::Error;

/// Errors that can occur in the auto-operator controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Object store error (transient: the pass is retried)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Kubernetes client setup or API error outside the object store
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Version pin resolution error
    #[error("Version resolution error: {0}")]
    Version(#[from] VersionError),

    /// Vendor source configuration error
    #[error("Vendor error: {0}")]
    Vendor(#[from] VendorError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// I/O error (config files, probe listener)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ControllerError {
    /// Short label used for the reconciliation outcome metric
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerError::Store(e) if e.is_conflict() => "conflict",
            ControllerError::Store(_) | ControllerError::Kube(_) => "store_error",
            _ => "error",
        }
    }
}
