//! Host registry: known hosts, liveness and cached runtime handles

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use updock_runtime::{RuntimeClient, RuntimeError};
use updock_store::{Host, HostStatus, Store, StoreError};

use crate::config::LocalHost;
use crate::error::CoreError;

/// Factory for runtime-client handles
///
/// Allows injection of different runtime implementations per host.
#[async_trait]
pub trait RuntimeFactory: Send + Sync {
    /// Handle for the runtime the daemon runs next to
    async fn local(&self) -> Result<Arc<dyn RuntimeClient>, RuntimeError>;

    /// Handle for a remote runtime reachable at `hostname:port`
    async fn remote(&self, hostname: &str, port: u16)
    -> Result<Arc<dyn RuntimeClient>, RuntimeError>;
}

/// Owns host identity (store rows) and connectivity (cached handles)
pub struct HostRegistry {
    store: Arc<dyn Store>,
    factory: Arc<dyn RuntimeFactory>,
    local: LocalHost,
    probe_timeout: Duration,
    clients: RwLock<HashMap<String, Arc<dyn RuntimeClient>>>,
}

impl HostRegistry {
    pub fn new(
        store: Arc<dyn Store>,
        factory: Arc<dyn RuntimeFactory>,
        local: LocalHost,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            store,
            factory,
            local,
            probe_timeout,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// The local host identity
    #[must_use]
    pub fn local(&self) -> &LocalHost {
        &self.local
    }

    /// Register a host after a successful liveness probe
    ///
    /// Returns `true` if the host is (now) registered, `false` if the probe
    /// failed. Registering a known host is a no-op.
    ///
    /// # Errors
    /// Returns `CoreError::Store` if the host table cannot be read or written
    #[instrument(skip(self))]
    pub async fn register(&self, hostname: &str, port: u16) -> Result<bool, CoreError> {
        if self.store.get_host(hostname).await?.is_some() {
            debug!("host already registered");
            return Ok(true);
        }

        let client = match self.probe(hostname, port).await {
            Ok(client) => client,
            Err(reason) => {
                warn!(host = %hostname, port, reason = %reason, "host probe failed, not registering");
                return Ok(false);
            }
        };

        match self.store.insert_host(hostname, port, HostStatus::Online).await {
            Ok(_) | Err(StoreError::HostExists(_)) => {}
            Err(e) => return Err(e.into()),
        }
        self.cache(hostname, client).await;

        info!(host = %hostname, port, "host registered");
        Ok(true)
    }

    /// Register the local host
    ///
    /// # Errors
    /// See [`HostRegistry::register`]
    pub async fn register_local(&self) -> Result<bool, CoreError> {
        let LocalHost { hostname, port } = self.local.clone();
        self.register(&hostname, port).await
    }

    /// All persisted hosts
    ///
    /// # Errors
    /// Returns `CoreError::Store` if the host table cannot be read
    pub async fn list(&self) -> Result<Vec<Host>, CoreError> {
        Ok(self.store.list_hosts().await?)
    }

    /// Runtime handle for `hostname`, constructed and cached on first use
    ///
    /// # Errors
    /// Returns `CoreError::HostNotFound` for an unknown remote host, or
    /// `CoreError::Connectivity` if the handle cannot be constructed
    pub async fn client_for(&self, hostname: &str) -> Result<Arc<dyn RuntimeClient>, CoreError> {
        if let Some(client) = self.clients.read().await.get(hostname) {
            return Ok(Arc::clone(client));
        }

        let built = if self.local.is_local(hostname) {
            self.factory.local().await
        } else {
            let host = self
                .store
                .get_host(hostname)
                .await?
                .ok_or_else(|| CoreError::HostNotFound(hostname.to_string()))?;
            self.factory.remote(&host.hostname, host.port).await
        };
        let client = built.map_err(|e| CoreError::Connectivity {
            host: hostname.to_string(),
            message: e.to_string(),
        })?;

        Ok(self.cache(hostname, client).await)
    }

    /// Mark a host offline; scans skip it until it is reconnected
    ///
    /// # Errors
    /// Returns `CoreError::HostNotFound` if the host is unknown
    pub async fn mark_offline(&self, hostname: &str) -> Result<(), CoreError> {
        self.store
            .set_host_status(hostname, HostStatus::Offline)
            .await?;
        warn!(host = %hostname, "host marked offline");
        Ok(())
    }

    /// Re-probe a known host and bring it back online
    ///
    /// On success the handle built by the probe replaces the cached one.
    ///
    /// # Errors
    /// Returns `CoreError::HostNotFound` if the host is unknown
    #[instrument(skip(self))]
    pub async fn reconnect(&self, hostname: &str) -> Result<bool, CoreError> {
        let host = self
            .store
            .get_host(hostname)
            .await?
            .ok_or_else(|| CoreError::HostNotFound(hostname.to_string()))?;

        let client = match self.probe(&host.hostname, host.port).await {
            Ok(client) => client,
            Err(reason) => {
                warn!(host = %hostname, reason = %reason, "reconnect probe failed");
                return Ok(false);
            }
        };

        self.store
            .set_host_status(hostname, HostStatus::Online)
            .await?;
        self.clients
            .write()
            .await
            .insert(hostname.to_string(), client);

        info!(host = %hostname, "host back online");
        Ok(true)
    }

    /// Insert unless another task got there first; returns the cached handle
    async fn cache(&self, hostname: &str, client: Arc<dyn RuntimeClient>) -> Arc<dyn RuntimeClient> {
        let mut clients = self.clients.write().await;
        Arc::clone(clients.entry(hostname.to_string()).or_insert(client))
    }

    /// Liveness probe; the local runtime is pinged, remote hosts get a TCP connect
    ///
    /// A successful probe yields the runtime handle for the host.
    async fn probe(&self, hostname: &str, port: u16) -> Result<Arc<dyn RuntimeClient>, String> {
        if self.local.is_local(hostname) {
            let client = self.factory.local().await.map_err(|e| e.to_string())?;
            client.ping().await.map_err(|e| e.to_string())?;
            return Ok(client);
        }

        match tokio::time::timeout(self.probe_timeout, TcpStream::connect((hostname, port))).await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.to_string()),
            Err(_) => {
                return Err(format!(
                    "connection timed out after {}s",
                    self.probe_timeout.as_secs()
                ));
            }
        }

        self.factory
            .remote(hostname, port)
            .await
            .map_err(|e| e.to_string())
    }
}
