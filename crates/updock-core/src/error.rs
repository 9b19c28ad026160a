//! Core error types for updock-core

use thiserror::Error;

use updock_runtime::RuntimeError;
use updock_store::StoreError;

/// Errors that can occur in the update engine
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A runtime host cannot be reached
    #[error("host {host} unreachable: {message}")]
    Connectivity {
        /// Hostname that failed
        host: String,
        /// Underlying failure
        message: String,
    },

    /// Update detection failed for one container
    #[error("update detection failed: {0}")]
    Detection(String),

    /// Host not found in registry
    #[error("host not found: {0}")]
    HostNotFound(String),

    /// Invalid configuration or input
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence failure
    #[error("store error: {0}")]
    Store(String),

    /// Operation timed out
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Actor communication error
    #[error("actor communication error: {0}")]
    Actor(String),
}

impl CoreError {
    /// Whether the error means a host could not be reached
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, CoreError::Connectivity { .. })
    }

    /// Classify a runtime failure seen while talking to `host`
    #[must_use]
    pub fn from_runtime(host: &str, err: RuntimeError) -> Self {
        if err.is_connectivity() {
            CoreError::Connectivity {
                host: host.to_string(),
                message: err.to_string(),
            }
        } else {
            CoreError::Detection(err.to_string())
        }
    }

    /// Whether the error reports a missing host
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::HostNotFound(_))
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::HostNotFound(host) => CoreError::HostNotFound(host),
            other => CoreError::Store(other.to_string()),
        }
    }
}

impl From<RuntimeError> for CoreError {
    fn from(err: RuntimeError) -> Self {
        CoreError::Detection(err.to_string())
    }
}
