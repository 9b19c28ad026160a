//! Error types for updock-runtime

use thiserror::Error;

/// Errors that can occur while talking to a container runtime
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    /// Runtime daemon cannot be reached
    #[error("runtime unreachable: {0}")]
    Unreachable(String),

    /// Container does not exist on the runtime
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// Image is not present in the local image cache
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// Registry pull failed
    #[error("pull of {image} failed: {message}")]
    PullFailed {
        /// Image reference being pulled
        image: String,
        /// Failure reported by the daemon or registry
        message: String,
    },

    /// Image reference could not be parsed
    #[error("invalid image reference: {0}")]
    InvalidReference(String),

    /// Runtime answered with an unexpected error
    #[error("runtime API error: {0}")]
    Api(String),

    /// Client could not be constructed
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl RuntimeError {
    /// Whether the error means the host itself is unreachable
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, RuntimeError::Unreachable(_))
    }
}
