//! Fleet coordinator: fan a check out over every registered host

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use updock_store::{HostCheckResult, Store};

use crate::error::CoreError;
use crate::registry::HostRegistry;
use crate::scanner::HostScanner;

pub struct FleetCoordinator {
    registry: Arc<HostRegistry>,
    scanner: Arc<HostScanner>,
    store: Arc<dyn Store>,
    host_scan_timeout: Duration,
}

impl FleetCoordinator {
    pub fn new(
        registry: Arc<HostRegistry>,
        scanner: Arc<HostScanner>,
        store: Arc<dyn Store>,
        host_scan_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            scanner,
            store,
            host_scan_timeout,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<HostRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Scan every registered host concurrently and append one history row per host
    ///
    /// The local host is registered first when no host is known yet.
    ///
    /// # Errors
    /// Fails only if the host list cannot be read or bootstrapped; per-host
    /// failures are part of the returned results.
    #[instrument(skip(self))]
    pub async fn check_all(&self) -> Result<Vec<HostCheckResult>, CoreError> {
        let mut hosts = self.registry.list().await?;
        if hosts.is_empty() {
            info!("no hosts registered, bootstrapping local host");
            if !self.registry.register_local().await? {
                warn!("local host could not be registered");
            }
            hosts = self.registry.list().await?;
        }

        info!(hosts = hosts.len(), "starting fleet check");

        let timeout = self.host_scan_timeout;
        let handles: Vec<_> = hosts
            .into_iter()
            .map(|host| {
                let scanner = Arc::clone(&self.scanner);
                let hostname = host.hostname.clone();
                let handle =
                    tokio::spawn(
                        async move { tokio::time::timeout(timeout, scanner.scan(&host)).await },
                    );
                (hostname, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (hostname, handle) in handles {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => {
                    error!(host = %hostname, timeout_secs = timeout.as_secs(), "host scan timed out");
                    HostCheckResult::failed(
                        &hostname,
                        format!("host scan timed out after {}s", timeout.as_secs()),
                    )
                }
                Err(e) => {
                    error!(host = %hostname, error = %e, "host scan task failed");
                    HostCheckResult::failed(&hostname, format!("host scan aborted: {e}"))
                }
            };

            if let Err(e) = self.store.append_history(&result, Utc::now()).await {
                warn!(host = %hostname, error = %e, "failed to append check history");
            }
            results.push(result);
        }

        info!(hosts = results.len(), "fleet check finished");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast;
    use updock_store::{CheckStatus, HostStatus, MemoryStore};

    use super::*;
    use crate::config::LocalHost;
    use crate::detector::UpdateDetector;
    use crate::registry::RuntimeFactory;
    use crate::testing::{MockFactory, MockRuntime};

    fn coordinator(store: Arc<dyn Store>, factory: impl RuntimeFactory + 'static) -> FleetCoordinator {
        let registry = Arc::new(HostRegistry::new(
            Arc::clone(&store),
            Arc::new(factory),
            LocalHost::new("server1", 2375),
            Duration::from_secs(1),
        ));
        let (tx, _) = broadcast::channel(16);
        let scanner = Arc::new(HostScanner::new(
            Arc::clone(&registry),
            UpdateDetector::new(Arc::clone(&store), false),
            Arc::clone(&store),
            tx,
        ));
        FleetCoordinator::new(registry, scanner, store, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_empty_fleet_bootstraps_local_host() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let local = MockRuntime::default()
            .with_container("c1", "web", "app:latest")
            .with_image("app:latest", "sha256:A", None);
        let fleet = coordinator(Arc::clone(&store), MockFactory::with_local(local));

        let results = fleet.check_all().await.unwrap();

        let hosts = store.list_hosts().await.unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].hostname, "server1");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].up_to_date, 1);
        assert_eq!(store.recent_history(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_host_failure_is_isolated() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        store
            .insert_host("alpha", 2375, HostStatus::Online)
            .await
            .unwrap();
        store
            .insert_host("beta", 2375, HostStatus::Online)
            .await
            .unwrap();

        let alpha = Arc::new(
            MockRuntime::default()
                .with_container("c1", "web", "app:latest")
                .with_image("app:latest", "sha256:A", None),
        );
        let factory = MockFactory::default()
            .with_remote("alpha", alpha)
            .with_remote("beta", Arc::new(MockRuntime::unreachable()));
        let fleet = coordinator(Arc::clone(&store), factory);

        let results = fleet.check_all().await.unwrap();
        assert_eq!(results.len(), 2);

        let history = store.recent_history(10).await.unwrap();
        let status_of = |host: &str| {
            history
                .iter()
                .find(|h| h.result.hostname == host)
                .map(|h| h.result.status)
        };
        assert_eq!(status_of("alpha"), Some(CheckStatus::Success));
        assert_eq!(status_of("beta"), Some(CheckStatus::Error));
        assert_eq!(history.len(), 2);

        let web = store.get_container("web", "alpha").await.unwrap().unwrap();
        assert!(web.status.is_latest());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_host_times_out_and_stays_online() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        store
            .insert_host("slow", 2375, HostStatus::Online)
            .await
            .unwrap();
        let factory = MockFactory::default().with_remote("slow", Arc::new(MockRuntime::hanging()));
        let fleet = coordinator(Arc::clone(&store), factory);

        let results = fleet.check_all().await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Error);
        assert_eq!(
            results[0].error_message.as_deref(),
            Some("host scan timed out after 30s")
        );

        let host = store.get_host("slow").await.unwrap().unwrap();
        assert_eq!(host.status, HostStatus::Online);

        let history = store.recent_history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].result.status, CheckStatus::Error);
    }
}
