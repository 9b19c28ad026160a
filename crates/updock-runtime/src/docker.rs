//! Docker engine runtime over bollard

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::{API_DEFAULT_VERSION, Docker};
use futures::StreamExt;
use tracing::{debug, info, instrument, trace};

use crate::error::RuntimeError;
use crate::reference::ImageReference;
use crate::traits::RuntimeClient;
use crate::types::{ContainerDetails, ContainerSummary, ImageDetails, PullOutcome, parse_timestamp};

/// Seconds bollard waits on a single request to a remote daemon
const REMOTE_TIMEOUT_SECS: u64 = 120;

/// Docker runtime client
///
/// Talks to either the local control socket or a remote engine over TCP.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
    endpoint: String,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon using platform defaults
    ///
    /// # Errors
    /// Returns `RuntimeError::ConfigError` if the client cannot be constructed
    pub fn connect_local() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::ConfigError(e.to_string()))?;
        Ok(Self {
            docker,
            endpoint: "local".to_string(),
        })
    }

    /// Connect to a remote Docker daemon at `hostname:port`
    ///
    /// No request is made; connectivity problems surface on first use.
    ///
    /// # Errors
    /// Returns `RuntimeError::ConfigError` if the address is not usable
    pub fn connect_remote(hostname: &str, port: u16) -> Result<Self, RuntimeError> {
        let endpoint = format!("tcp://{hostname}:{port}");
        let docker = Docker::connect_with_http(&endpoint, REMOTE_TIMEOUT_SECS, API_DEFAULT_VERSION)
            .map_err(|e| RuntimeError::ConfigError(e.to_string()))?;
        Ok(Self { docker, endpoint })
    }

    /// Endpoint description, `local` or `tcp://host:port`
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_error(
        &self,
        err: BollardError,
        not_found: impl FnOnce(String) -> RuntimeError,
    ) -> RuntimeError {
        match err {
            BollardError::DockerResponseServerError {
                status_code: 404,
                message,
            } => not_found(message),
            BollardError::DockerResponseServerError {
                status_code,
                message,
            } => RuntimeError::Api(format!("{status_code}: {message}")),
            BollardError::IOError { .. } | BollardError::RequestTimeoutError => {
                RuntimeError::Unreachable(format!("{}: {err}", self.endpoint))
            }
            other => RuntimeError::Api(other.to_string()),
        }
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::Unreachable(format!("{}: {e}", self.endpoint)))
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            // listing never targets a single object, a 404 means a broken endpoint
            .map_err(|e| self.map_error(e, RuntimeError::Unreachable))?;

        debug!(count = containers.len(), "listed running containers");

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                Some(ContainerSummary {
                    id: c.id?,
                    names: c.names.unwrap_or_default(),
                    image: c.image.unwrap_or_default(),
                })
            })
            .collect())
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        let details = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| self.map_error(e, RuntimeError::ContainerNotFound))?;

        trace!(
            "container details: {}",
            serde_json::to_string_pretty(&details).unwrap_or_default()
        );

        let image = details
            .config
            .as_ref()
            .and_then(|c| c.image.clone())
            .ok_or_else(|| RuntimeError::Api(format!("container {id} has no configured image")))?;

        Ok(ContainerDetails {
            id: details.id.unwrap_or_else(|| id.to_string()),
            name: details
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image,
            created_at: parse_timestamp(details.created.as_deref()),
        })
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn inspect_image(&self, reference: &str) -> Result<ImageDetails, RuntimeError> {
        let image = self
            .docker
            .inspect_image(reference)
            .await
            .map_err(|e| self.map_error(e, RuntimeError::ImageNotFound))?;

        Ok(ImageDetails {
            id: image.id.unwrap_or_default(),
            repo_digests: image.repo_digests.unwrap_or_default(),
            created_at: parse_timestamp(image.created.as_deref()),
        })
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint, image = %reference))]
    async fn pull_image(&self, reference: &ImageReference) -> Result<PullOutcome, RuntimeError> {
        let options = CreateImageOptions {
            from_image: reference.repository().to_string(),
            tag: reference.pull_tag(),
            ..Default::default()
        };

        let mut digest = None;
        let mut pull_stream = self.docker.create_image(Some(options), None, None);
        while let Some(result) = pull_stream.next().await {
            let output = result.map_err(|e| match self.map_error(e, RuntimeError::ImageNotFound) {
                RuntimeError::Unreachable(msg) => RuntimeError::Unreachable(msg),
                other => RuntimeError::PullFailed {
                    image: reference.to_string(),
                    message: other.to_string(),
                },
            })?;
            trace!("{output:?}");

            if let Some(message) = output.error {
                return Err(RuntimeError::PullFailed {
                    image: reference.to_string(),
                    message,
                });
            }
            if let Some(status) = &output.status
                && status.contains("Digest:")
                && let Some(pos) = status.find("sha256:")
            {
                digest = Some(status[pos..].trim().to_string());
            }
        }

        // Some registries never print a digest line; the cache knows it after the pull.
        if digest.is_none() {
            let image = self.inspect_image(&reference.to_string()).await?;
            digest = image.first_digest().map(str::to_string);
        }

        info!(digest = ?digest, "image pulled");
        Ok(PullOutcome { digest })
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint, image = %reference))]
    async fn remote_digest(
        &self,
        reference: &ImageReference,
    ) -> Result<Option<String>, RuntimeError> {
        let inspect = self
            .docker
            .inspect_registry_image(&reference.to_string(), None)
            .await
            .map_err(|e| self.map_error(e, RuntimeError::ImageNotFound))?;

        let digest = inspect.descriptor.digest;
        debug!(digest = ?digest, "registry digest resolved");
        Ok(digest.filter(|d| !d.is_empty()))
    }

    fn runtime_type(&self) -> &'static str {
        "docker"
    }
}
