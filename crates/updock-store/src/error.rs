//! Error types for updock-store

use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Embedded migrations could not be applied
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No host row with this hostname
    #[error("host not found: {0}")]
    HostNotFound(String),

    /// Host row already exists
    #[error("host already exists: {0}")]
    HostExists(String),

    /// No container row for this `(name, host)` key
    #[error("container not found: {name} on {host}")]
    ContainerNotFound {
        /// Container name
        name: String,
        /// Owning hostname
        host: String,
    },

    /// Row contents could not be mapped to a model
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Store URL not understood
    #[error("unsupported store url: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    /// Whether the error reports a missing row
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::HostNotFound(_) | StoreError::ContainerNotFound { .. }
        )
    }
}
