//! updock-store: Persistent inventory and history
//!
//! Provides the `Store` capability used by the update engine, with SQLite and
//! in-memory implementations.

pub mod error;
pub mod memory;
pub mod models;
pub mod sqlite;
pub mod traits;

use std::sync::Arc;

use tracing::info;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{
    CheckStatus, ContainerRecord, ContainerUpdate, HistoryEntry, Host, HostCheckResult,
    HostStatus, NewContainer, UpdateStatus,
};
pub use sqlite::SqliteStore;
pub use traits::Store;

/// URL selecting the ephemeral in-memory store
pub const MEMORY_URL: &str = "memory";

/// Open the store described by `url`
///
/// `memory` selects the in-memory store, anything starting with `sqlite:` a
/// SQLite database with migrations applied.
///
/// # Errors
/// Returns `StoreError::InvalidUrl` for unknown schemes, or the underlying
/// database error if the connection or migration fails.
pub async fn open(url: &str) -> Result<Arc<dyn Store>, StoreError> {
    if url == MEMORY_URL {
        info!("using in-memory store, inventory is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    if url.starts_with("sqlite:") {
        let store = SqliteStore::connect(url).await?;
        store.migrate().await?;
        return Ok(Arc::new(store));
    }

    Err(StoreError::InvalidUrl(url.to_string()))
}
