//! Update detection for a single container
//!
//! Mutable tags (`latest`) are compared by local image id before and after a
//! pull, since a pull can move the digest mapping without changing the image
//! and vice versa. Pinned tags are compared by registry digest, resolved
//! read-only through the registry when possible and by pulling otherwise.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use updock_runtime::{ImageDetails, ImageReference, RuntimeClient, TagKind};
use updock_store::{ContainerUpdate, Store, UpdateStatus};

use crate::error::CoreError;

pub struct UpdateDetector {
    store: Arc<dyn Store>,
    registry_lookup: bool,
}

impl UpdateDetector {
    pub fn new(store: Arc<dyn Store>, registry_lookup: bool) -> Self {
        Self {
            store,
            registry_lookup,
        }
    }

    /// Check one container and record the outcome on its `(name, host)` row
    ///
    /// Runtime failures are recorded as an unknown status rather than
    /// returned.
    ///
    /// # Errors
    /// Returns `CoreError::Store` only if the outcome cannot be written
    #[instrument(skip(self, client), fields(host = %hostname))]
    pub async fn detect(
        &self,
        client: &dyn RuntimeClient,
        container_id: &str,
        name: &str,
        hostname: &str,
    ) -> Result<UpdateStatus, CoreError> {
        let update = match self.evaluate(client, container_id).await {
            Ok(update) => update,
            Err(e) => {
                warn!(container = %name, error = %e, "update check failed");
                ContainerUpdate::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let status = update.status();
        self.store
            .update_container(name, hostname, &update, Utc::now())
            .await?;

        if status.has_update() {
            info!(container = %name, "update available");
        }
        Ok(status)
    }

    async fn evaluate(
        &self,
        client: &dyn RuntimeClient,
        container_id: &str,
    ) -> Result<ContainerUpdate, CoreError> {
        let container = client.inspect_container(container_id).await?;
        let reference = ImageReference::parse(&container.image)?;
        let image = client.inspect_image(&container.image).await?;

        let (current, latest, image_created) = match reference.tag_kind() {
            TagKind::Mutable => {
                client.pull_image(&reference).await?;
                let pulled = client.inspect_image(&container.image).await?;
                (image.id, pulled.id, pulled.created_at)
            }
            TagKind::Pinned => {
                let current = current_digest(&image, &container.image)?;
                let latest = self.latest_digest(client, &reference).await?;
                (current, latest, image.created_at)
            }
        };

        debug!(image = %container.image, %current, %latest, "compared image identities");

        Ok(if current == latest {
            ContainerUpdate::UpToDate {
                image: container.image,
                version: current,
                created_at: container.created_at,
                image_created,
            }
        } else {
            ContainerUpdate::UpdateAvailable {
                image: container.image,
                current_version: current,
                latest_version: latest,
                created_at: container.created_at,
                image_created,
            }
        })
    }

    async fn latest_digest(
        &self,
        client: &dyn RuntimeClient,
        reference: &ImageReference,
    ) -> Result<String, CoreError> {
        if self.registry_lookup {
            match client.remote_digest(reference).await {
                Ok(Some(digest)) => return Ok(digest),
                Ok(None) => debug!(image = %reference, "registry lookup unavailable, pulling"),
                Err(e) => debug!(image = %reference, error = %e, "registry lookup failed, pulling"),
            }
        }

        client
            .pull_image(reference)
            .await?
            .digest
            .ok_or_else(|| CoreError::Detection(format!("pull of {reference} reported no digest")))
    }
}

/// Digest of the first repo-digest entry; other registries are ignored
fn current_digest(image: &ImageDetails, reference: &str) -> Result<String, CoreError> {
    image
        .first_digest()
        .map(str::to_string)
        .ok_or_else(|| CoreError::Detection(format!("{reference} has no repository digest")))
}
