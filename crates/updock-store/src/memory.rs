//! In-memory store, lost on restart

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{
    ContainerRecord, ContainerUpdate, HistoryEntry, Host, HostCheckResult, HostStatus,
    NewContainer, UpdateStatus,
};
use crate::traits::Store;

#[derive(Default)]
struct Tables {
    hosts: BTreeMap<String, Host>,
    /// Keyed by `(host, name)` so iteration matches inventory order
    containers: BTreeMap<(String, String), ContainerRecord>,
    history: Vec<HistoryEntry>,
    next_container_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(name: &str, host: &str) -> (String, String) {
    (host.to_string(), name.to_string())
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_host(&self, hostname: &str) -> Result<Option<Host>, StoreError> {
        Ok(self.tables.read().await.hosts.get(hostname).cloned())
    }

    async fn insert_host(
        &self,
        hostname: &str,
        port: u16,
        status: HostStatus,
    ) -> Result<Host, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.hosts.contains_key(hostname) {
            return Err(StoreError::HostExists(hostname.to_string()));
        }
        let host = Host {
            hostname: hostname.to_string(),
            port,
            status,
            created_at: Utc::now(),
        };
        tables.hosts.insert(hostname.to_string(), host.clone());
        Ok(host)
    }

    async fn set_host_status(&self, hostname: &str, status: HostStatus) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let host = tables
            .hosts
            .get_mut(hostname)
            .ok_or_else(|| StoreError::HostNotFound(hostname.to_string()))?;
        host.status = status;
        Ok(())
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, StoreError> {
        Ok(self.tables.read().await.hosts.values().cloned().collect())
    }

    async fn get_container(
        &self,
        name: &str,
        host: &str,
    ) -> Result<Option<ContainerRecord>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .containers
            .get(&key(name, host))
            .cloned())
    }

    async fn insert_container(
        &self,
        container: &NewContainer,
    ) -> Result<ContainerRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_container_id + 1;
        let mut inserted = false;
        let record = tables
            .containers
            .entry(key(&container.name, &container.host))
            .or_insert_with(|| {
                inserted = true;
                ContainerRecord {
                    id,
                    name: container.name.clone(),
                    host: container.host.clone(),
                    image: container.image.clone(),
                    current_version: None,
                    latest_version: None,
                    created_at: None,
                    image_created: None,
                    last_checked: None,
                    status: UpdateStatus::Pending,
                }
            })
            .clone();
        if inserted {
            tables.next_container_id = id;
        }
        Ok(record)
    }

    async fn update_container(
        &self,
        name: &str,
        host: &str,
        update: &ContainerUpdate,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let record = tables.containers.get_mut(&key(name, host)).ok_or_else(|| {
            StoreError::ContainerNotFound {
                name: name.to_string(),
                host: host.to_string(),
            }
        })?;
        update.apply(record, checked_at);
        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerRecord>, StoreError> {
        Ok(self.tables.read().await.containers.values().cloned().collect())
    }

    async fn containers_for_host(&self, host: &str) -> Result<Vec<ContainerRecord>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .containers
            .values()
            .filter(|c| c.host == host)
            .cloned()
            .collect())
    }

    async fn append_history(
        &self,
        result: &HostCheckResult,
        timestamp: DateTime<Utc>,
    ) -> Result<HistoryEntry, StoreError> {
        let mut tables = self.tables.write().await;
        let entry = HistoryEntry {
            id: i64::try_from(tables.history.len()).unwrap_or(i64::MAX) + 1,
            result: result.clone(),
            timestamp,
        };
        tables.history.push(entry.clone());
        Ok(entry)
    }

    async fn recent_history(&self, limit: u32) -> Result<Vec<HistoryEntry>, StoreError> {
        let tables = self.tables.read().await;
        let mut entries = tables.history.clone();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}
