//! Controller-specific error types.

use kube_store::StoreError;
use thiserror::Error;

/// Errors that can occur in the drift detector.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Object store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Kubernetes client setup error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
