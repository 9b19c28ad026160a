//! Runtime factory backed by the Docker engine API

use std::sync::Arc;

use async_trait::async_trait;
use updock_core::RuntimeFactory;
use updock_runtime::{DockerRuntime, RuntimeClient, RuntimeError};

/// Default implementation of `RuntimeFactory`
///
/// The local host talks to the platform socket, remote hosts to
/// `tcp://host:port`.
#[derive(Debug, Default)]
pub struct DockerFactory;

impl DockerFactory {
    /// Create a new factory instance
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RuntimeFactory for DockerFactory {
    async fn local(&self) -> Result<Arc<dyn RuntimeClient>, RuntimeError> {
        Ok(Arc::new(DockerRuntime::connect_local()?))
    }

    async fn remote(
        &self,
        hostname: &str,
        port: u16,
    ) -> Result<Arc<dyn RuntimeClient>, RuntimeError> {
        Ok(Arc::new(DockerRuntime::connect_remote(hostname, port)?))
    }
}
