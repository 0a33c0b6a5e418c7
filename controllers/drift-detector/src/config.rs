//! Drift detector configuration.

use crate::error::ControllerError;
use std::time::Duration;

const DEFAULT_DRIFT_INTERVAL_SECS: u64 = 600;
const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Delay between two drift checks of the same Channel
    pub drift_interval: Duration,
    /// Requeue after a transient error
    pub error_requeue: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            drift_interval: seconds("DRIFT_INTERVAL_SECS", lookup("DRIFT_INTERVAL_SECS"), DEFAULT_DRIFT_INTERVAL_SECS)?,
            error_requeue: seconds("ERROR_REQUEUE_SECS", lookup("ERROR_REQUEUE_SECS"), DEFAULT_ERROR_REQUEUE_SECS)?,
        })
    }
}

fn seconds(key: &str, value: Option<String>, default: u64) -> Result<Duration, ControllerError> {
    let secs = match value.as_deref().map(str::trim) {
        None | Some("") => default,
        Some(v) => v
            .parse::<u64>()
            .map_err(|e| ControllerError::InvalidConfig(format!("{}={:?}: {}", key, v, e)))?,
    };
    if secs == 0 {
        return Err(ControllerError::InvalidConfig(format!("{} must be greater than zero", key)));
    }
    Ok(Duration::from_secs(secs))
}
