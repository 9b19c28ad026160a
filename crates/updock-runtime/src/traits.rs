//! Runtime client trait

use async_trait::async_trait;

use crate::error::RuntimeError;
use crate::reference::ImageReference;
use crate::types::{ContainerDetails, ContainerSummary, ImageDetails, PullOutcome};

/// Capability interface to one container-runtime endpoint
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Check that the runtime daemon answers
    async fn ping(&self) -> Result<(), RuntimeError>;

    /// List running containers
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError>;

    /// Inspect one container by id or name
    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError>;

    /// Inspect an image in the local image cache
    async fn inspect_image(&self, reference: &str) -> Result<ImageDetails, RuntimeError>;

    /// Pull an image from its registry, mutating the local image cache
    async fn pull_image(&self, reference: &ImageReference) -> Result<PullOutcome, RuntimeError>;

    /// Look up the registry digest of a reference without pulling it
    ///
    /// `Ok(None)` means this runtime cannot answer the question.
    async fn remote_digest(
        &self,
        _reference: &ImageReference,
    ) -> Result<Option<String>, RuntimeError> {
        Ok(None)
    }

    /// Short name of the implementation, for logs
    fn runtime_type(&self) -> &'static str;
}
