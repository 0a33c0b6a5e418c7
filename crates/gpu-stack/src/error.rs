//! GPU stack resolution errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving version pins for a track
#[derive(Debug, Error)]
pub enum VersionError {
    /// Track identifier is not one of stable, lts, canary
    #[error("unsupported release track {0:?}, expected one of stable, lts, canary")]
    InvalidTrack(String),

    /// No pin metadata exists for the track
    #[error("no version pins found for track {0}")]
    NotFound(String),

    /// Pin metadata exists but does not have the expected shape
    #[error("malformed version pins for track {track}: {reason}")]
    Malformed { track: String, reason: String },

    /// Reading the pin file failed for a reason other than absence
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the pin ConfigMap failed
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
}

/// Errors raised at the vendor boundary
#[derive(Debug, Error)]
pub enum VendorError {
    /// Vendor string is not one of nvidia, amd, intel
    #[error("unsupported vendor: {0}")]
    Unsupported(String),

    /// Vendor source overlay could not be parsed
    #[error("malformed vendor sources: {0}")]
    Malformed(String),
}
