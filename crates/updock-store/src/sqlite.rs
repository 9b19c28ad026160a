//! SQLite store over sqlx

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::models::{
    ContainerRecord, ContainerUpdate, HistoryEntry, Host, HostCheckResult, HostStatus,
    NewContainer, UpdateStatus,
};
use crate::traits::Store;

/// Keeps `last_checked` from moving backward; binds the new timestamp twice
const CLAMP_LAST_CHECKED: &str = "last_checked = CASE \
    WHEN last_checked IS NULL OR julianday(last_checked) < julianday(?) THEN ? \
    ELSE last_checked END";

const CONTAINER_COLUMNS: &str = "id, name, host, image, current_version, latest_version, \
    created_at, image_created, last_checked, status, error_message";

const HISTORY_COLUMNS: &str = "id, hostname, total_containers, up_to_date, updates_available, \
    errors, status, error_message, timestamp";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `database_url`, creating the database file if needed
    ///
    /// # Errors
    /// Returns `StoreError::Database` if the database cannot be created or opened
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        info!("connecting to database: {database_url}");

        let in_memory = database_url.contains(":memory:");
        if !in_memory && !sqlx::Sqlite::database_exists(database_url).await? {
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = if in_memory {
            // every connection to :memory: is its own database
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(database_url)
                .await?
        } else {
            SqlitePool::connect(database_url).await?
        };

        Ok(Self { pool })
    }

    /// Fresh migrated in-memory database
    ///
    /// # Errors
    /// Returns `StoreError` if the pool or migrations fail
    pub async fn in_memory() -> Result<Self, StoreError> {
        let store = Self::connect("sqlite::memory:").await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Run embedded database migrations
    ///
    /// # Errors
    /// Returns `StoreError::Migration` if a migration fails
    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("running database migrations");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

fn to_u32(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

fn host_from_row(row: &SqliteRow) -> Result<Host, StoreError> {
    let port: i64 = row.try_get("port")?;
    let status: String = row.try_get("status")?;
    Ok(Host {
        hostname: row.try_get("hostname")?,
        port: u16::try_from(port)
            .map_err(|_| StoreError::Corrupt(format!("port out of range: {port}")))?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

fn container_from_row(row: &SqliteRow) -> Result<ContainerRecord, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(ContainerRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        host: row.try_get("host")?,
        image: row.try_get("image")?,
        current_version: row.try_get("current_version")?,
        latest_version: row.try_get("latest_version")?,
        created_at: row.try_get("created_at")?,
        image_created: row.try_get("image_created")?,
        last_checked: row.try_get("last_checked")?,
        status: UpdateStatus::from_columns(&status, row.try_get("error_message")?)?,
    })
}

fn history_from_row(row: &SqliteRow) -> Result<HistoryEntry, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(HistoryEntry {
        id: row.try_get("id")?,
        result: HostCheckResult {
            hostname: row.try_get("hostname")?,
            total_containers: to_u32(row.try_get("total_containers")?, "total_containers")?,
            up_to_date: to_u32(row.try_get("up_to_date")?, "up_to_date")?,
            updates_available: to_u32(row.try_get("updates_available")?, "updates_available")?,
            errors: to_u32(row.try_get("errors")?, "errors")?,
            status: status.parse()?,
            error_message: row.try_get("error_message")?,
        },
        timestamp: row.try_get("timestamp")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_host(&self, hostname: &str) -> Result<Option<Host>, StoreError> {
        let row = sqlx::query("SELECT hostname, port, status, created_at FROM hosts WHERE hostname = ?")
            .bind(hostname)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(host_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn insert_host(
        &self,
        hostname: &str,
        port: u16,
        status: HostStatus,
    ) -> Result<Host, StoreError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO hosts (hostname, port, status, created_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(hostname) DO NOTHING
            ",
        )
        .bind(hostname)
        .bind(i64::from(port))
        .bind(status.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::HostExists(hostname.to_string()));
        }

        debug!("host row inserted");
        Ok(Host {
            hostname: hostname.to_string(),
            port,
            status,
            created_at,
        })
    }

    async fn set_host_status(&self, hostname: &str, status: HostStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE hosts SET status = ? WHERE hostname = ?")
            .bind(status.as_str())
            .bind(hostname)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::HostNotFound(hostname.to_string()));
        }
        Ok(())
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, StoreError> {
        let rows =
            sqlx::query("SELECT hostname, port, status, created_at FROM hosts ORDER BY hostname")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(host_from_row).collect()
    }

    async fn get_container(
        &self,
        name: &str,
        host: &str,
    ) -> Result<Option<ContainerRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CONTAINER_COLUMNS} FROM containers WHERE name = ? AND host = ?"
        ))
        .bind(name)
        .bind(host)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(container_from_row).transpose()
    }

    async fn insert_container(
        &self,
        container: &NewContainer,
    ) -> Result<ContainerRecord, StoreError> {
        sqlx::query(
            r"
            INSERT INTO containers (name, host, image) VALUES (?, ?, ?)
            ON CONFLICT(name, host) DO NOTHING
            ",
        )
        .bind(&container.name)
        .bind(&container.host)
        .bind(&container.image)
        .execute(&self.pool)
        .await?;

        self.get_container(&container.name, &container.host)
            .await?
            .ok_or_else(|| StoreError::ContainerNotFound {
                name: container.name.clone(),
                host: container.host.clone(),
            })
    }

    #[instrument(skip(self, update))]
    async fn update_container(
        &self,
        name: &str,
        host: &str,
        update: &ContainerUpdate,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let status = update.status();
        let set_columns = match update {
            ContainerUpdate::Failed { .. } => "status = ?, error_message = ?",
            _ => {
                "image = ?, current_version = ?, latest_version = ?, created_at = ?, \
                 image_created = ?, status = ?, error_message = NULL"
            }
        };
        let sql = format!(
            "UPDATE containers SET {set_columns}, {CLAMP_LAST_CHECKED} WHERE name = ? AND host = ?"
        );

        let query = match update {
            ContainerUpdate::UpToDate {
                image,
                version,
                created_at,
                image_created,
            } => sqlx::query(&sql)
                .bind(image)
                .bind(version)
                .bind(version)
                .bind(*created_at)
                .bind(*image_created)
                .bind(status.kind()),
            ContainerUpdate::UpdateAvailable {
                image,
                current_version,
                latest_version,
                created_at,
                image_created,
            } => sqlx::query(&sql)
                .bind(image)
                .bind(current_version)
                .bind(latest_version)
                .bind(*created_at)
                .bind(*image_created)
                .bind(status.kind()),
            ContainerUpdate::Failed { reason } => {
                sqlx::query(&sql).bind(status.kind()).bind(reason)
            }
        };

        let result = query
            .bind(checked_at)
            .bind(checked_at)
            .bind(name)
            .bind(host)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ContainerNotFound {
                name: name.to_string(),
                host: host.to_string(),
            });
        }
        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTAINER_COLUMNS} FROM containers ORDER BY host, name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(container_from_row).collect()
    }

    async fn containers_for_host(&self, host: &str) -> Result<Vec<ContainerRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTAINER_COLUMNS} FROM containers WHERE host = ? ORDER BY name"
        ))
        .bind(host)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(container_from_row).collect()
    }

    #[instrument(skip(self, result), fields(host = %result.hostname, status = %result.status))]
    async fn append_history(
        &self,
        result: &HostCheckResult,
        timestamp: DateTime<Utc>,
    ) -> Result<HistoryEntry, StoreError> {
        let row = sqlx::query(
            r"
            INSERT INTO update_check_history
                (hostname, total_containers, up_to_date, updates_available, errors,
                 status, error_message, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(&result.hostname)
        .bind(i64::from(result.total_containers))
        .bind(i64::from(result.up_to_date))
        .bind(i64::from(result.updates_available))
        .bind(i64::from(result.errors))
        .bind(result.status.as_str())
        .bind(&result.error_message)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(HistoryEntry {
            id: row.try_get("id")?,
            result: result.clone(),
            timestamp,
        })
    }

    async fn recent_history(&self, limit: u32) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM update_check_history \
             ORDER BY julianday(timestamp) DESC, id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(history_from_row).collect()
    }

    fn store_type(&self) -> &'static str {
        "sqlite"
    }
}
