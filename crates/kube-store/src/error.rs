//! Object store errors

use thiserror::Error;

/// Errors that can occur when reading or writing through an [`ObjectStore`](crate::ObjectStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency conflict or create of an existing object
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Object cannot be written as given (e.g. missing name)
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// Store backend refused or failed the request
    #[error("Store backend error: {0}")]
    Backend(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other Kubernetes API or transport failure
    #[error("Kubernetes error: {0}")]
    Kube(kube::Error),
}

impl StoreError {
    /// True for optimistic-concurrency conflicts
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<kube::Error> for StoreError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(ae) if ae.code == 404 => StoreError::NotFound(ae.message.clone()),
            kube::Error::Api(ae) if ae.code == 409 => StoreError::Conflict(ae.message.clone()),
            other => StoreError::Kube(other),
        }
    }
}
