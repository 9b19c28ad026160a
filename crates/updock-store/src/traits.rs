//! Store trait definition

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{
    ContainerRecord, ContainerUpdate, HistoryEntry, Host, HostCheckResult, HostStatus,
    NewContainer,
};

/// Persistent inventory of hosts, containers and check history
///
/// Every method is a single independent write or read; callers must not
/// assume any grouping across calls.
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up a host by hostname
    async fn get_host(&self, hostname: &str) -> Result<Option<Host>, StoreError>;

    /// Insert a new host row
    ///
    /// Fails with `StoreError::HostExists` if the hostname is already known.
    async fn insert_host(&self, hostname: &str, port: u16, status: HostStatus)
    -> Result<Host, StoreError>;

    /// Set the liveness status of an existing host
    async fn set_host_status(&self, hostname: &str, status: HostStatus) -> Result<(), StoreError>;

    /// All hosts, ordered by hostname
    async fn list_hosts(&self) -> Result<Vec<Host>, StoreError>;

    /// Look up a container row by its `(name, host)` key
    async fn get_container(
        &self,
        name: &str,
        host: &str,
    ) -> Result<Option<ContainerRecord>, StoreError>;

    /// Insert the row for a newly observed container
    ///
    /// Returns the existing row unchanged if the key is already present.
    async fn insert_container(&self, container: &NewContainer)
    -> Result<ContainerRecord, StoreError>;

    /// Apply one check outcome to an existing container row
    ///
    /// `last_checked` is set to the later of its current value and `checked_at`.
    async fn update_container(
        &self,
        name: &str,
        host: &str,
        update: &ContainerUpdate,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// The full inventory, ordered by host then name
    async fn list_containers(&self) -> Result<Vec<ContainerRecord>, StoreError>;

    /// All container rows of one host
    async fn containers_for_host(&self, host: &str) -> Result<Vec<ContainerRecord>, StoreError>;

    /// Append a history row for one host's check result
    async fn append_history(
        &self,
        result: &HostCheckResult,
        timestamp: DateTime<Utc>,
    ) -> Result<HistoryEntry, StoreError>;

    /// Most recent history rows first, at most `limit`
    async fn recent_history(&self, limit: u32) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Backend name for logs
    fn store_type(&self) -> &'static str;
}
