//! Host scanner: reconcile one host's containers and aggregate its result

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

use updock_api::FleetEvent;
use updock_runtime::{ContainerSummary, RuntimeClient};
use updock_store::{ContainerUpdate, Host, HostCheckResult, NewContainer, Store, UpdateStatus};

use crate::detector::UpdateDetector;
use crate::error::CoreError;
use crate::registry::HostRegistry;

pub struct HostScanner {
    registry: Arc<HostRegistry>,
    detector: UpdateDetector,
    store: Arc<dyn Store>,
    event_tx: broadcast::Sender<FleetEvent>,
}

impl HostScanner {
    pub fn new(
        registry: Arc<HostRegistry>,
        detector: UpdateDetector,
        store: Arc<dyn Store>,
        event_tx: broadcast::Sender<FleetEvent>,
    ) -> Self {
        Self {
            registry,
            detector,
            store,
            event_tx,
        }
    }

    /// Scan one host
    ///
    /// Offline hosts are skipped without touching the runtime. A host whose
    /// runtime cannot be reached or listed is marked offline.
    #[instrument(skip(self, host), fields(host = %host.hostname))]
    pub async fn scan(&self, host: &Host) -> HostCheckResult {
        if host.is_offline() {
            info!("host offline, skipping scan");
            return HostCheckResult::offline(&host.hostname);
        }

        let (client, containers) = match self.connect(&host.hostname).await {
            Ok(listed) => listed,
            Err(e) => {
                self.demote(&host.hostname, &e).await;
                return HostCheckResult::failed(&host.hostname, e.to_string());
            }
        };

        join_all(
            containers
                .iter()
                .map(|c| self.check_container(client.as_ref(), c, &host.hostname)),
        )
        .await;

        match self.store.containers_for_host(&host.hostname).await {
            Ok(records) => {
                let result = HostCheckResult::from_records(&host.hostname, &records);
                info!(
                    total = result.total_containers,
                    up_to_date = result.up_to_date,
                    updates_available = result.updates_available,
                    errors = result.errors,
                    "host scan finished"
                );
                result
            }
            Err(e) => {
                error!(error = %e, "failed to read back host inventory");
                HostCheckResult::failed(&host.hostname, e.to_string())
            }
        }
    }

    async fn connect(
        &self,
        hostname: &str,
    ) -> Result<(Arc<dyn RuntimeClient>, Vec<ContainerSummary>), CoreError> {
        let client = self.registry.client_for(hostname).await?;
        let containers = client
            .list_containers()
            .await
            .map_err(|e| CoreError::from_runtime(hostname, e))?;
        Ok((client, containers))
    }

    async fn demote(&self, hostname: &str, cause: &CoreError) {
        warn!(error = %cause, "host scan failed");
        if let Err(e) = self.registry.mark_offline(hostname).await {
            error!(error = %e, "failed to mark host offline");
            return;
        }
        let _ = self.event_tx.send(FleetEvent::HostOffline {
            host: hostname.to_string(),
            reason: cause.to_string(),
        });
    }

    /// Insert the row if new, then run detection; failures stay with this container
    async fn check_container(
        &self,
        client: &dyn RuntimeClient,
        container: &ContainerSummary,
        hostname: &str,
    ) {
        let name = container.display_name();
        if let Err(e) = self.reconcile(client, container, &name, hostname).await {
            warn!(container = %name, error = %e, "container check failed");
            let failed = ContainerUpdate::Failed {
                reason: e.to_string(),
            };
            if let Err(e) = self
                .store
                .update_container(&name, hostname, &failed, Utc::now())
                .await
            {
                error!(container = %name, error = %e, "failed to record container error");
            }
        }
    }

    async fn reconcile(
        &self,
        client: &dyn RuntimeClient,
        container: &ContainerSummary,
        name: &str,
        hostname: &str,
    ) -> Result<UpdateStatus, CoreError> {
        if self.store.get_container(name, hostname).await?.is_none() {
            self.store
                .insert_container(&NewContainer {
                    name: name.to_string(),
                    host: hostname.to_string(),
                    image: container.image.clone(),
                })
                .await?;
        }
        self.detector
            .detect(client, &container.id, name, hostname)
            .await
    }
}
