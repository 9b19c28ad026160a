//! Persisted models: hosts, container records, check history

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use updock_api::FleetStats;

use crate::error::StoreError;

/// Liveness status of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    Online,
    Offline,
}

impl HostStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HostStatus::Online => "online",
            HostStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(HostStatus::Online),
            "offline" => Ok(HostStatus::Offline),
            other => Err(StoreError::Corrupt(format!("unknown host status {other}"))),
        }
    }
}

/// A container-runtime endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub hostname: String,
    pub port: u16,
    pub status: HostStatus,
    pub created_at: DateTime<Utc>,
}

impl Host {
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.status == HostStatus::Offline
    }
}

/// Staleness of one container's image
///
/// Replaces independent `latest`/`new`/`error` flags; the legacy views are
/// available through [`UpdateStatus::is_latest`] and friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UpdateStatus {
    /// Recorded but never checked
    Pending,
    UpToDate,
    UpdateAvailable,
    /// Last check failed; staleness is unknown
    Unknown { reason: String },
}

impl UpdateStatus {
    /// Column value for the status kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateStatus::Pending => "pending",
            UpdateStatus::UpToDate => "up_to_date",
            UpdateStatus::UpdateAvailable => "update_available",
            UpdateStatus::Unknown { .. } => "unknown",
        }
    }

    /// Rebuild from the persisted kind and error message
    ///
    /// # Errors
    /// Returns `StoreError::Corrupt` for an unknown kind
    pub fn from_columns(kind: &str, error_message: Option<String>) -> Result<Self, StoreError> {
        match kind {
            "pending" => Ok(UpdateStatus::Pending),
            "up_to_date" => Ok(UpdateStatus::UpToDate),
            "update_available" => Ok(UpdateStatus::UpdateAvailable),
            "unknown" => Ok(UpdateStatus::Unknown {
                reason: error_message.unwrap_or_default(),
            }),
            other => Err(StoreError::Corrupt(format!("unknown update status {other}"))),
        }
    }

    #[must_use]
    pub fn is_latest(&self) -> bool {
        matches!(self, UpdateStatus::UpToDate)
    }

    #[must_use]
    pub fn has_update(&self) -> bool {
        matches!(self, UpdateStatus::UpdateAvailable)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, UpdateStatus::Unknown { .. })
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            UpdateStatus::Unknown { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Inventory row for one container on one host, keyed by `(name, host)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub image: String,
    pub current_version: Option<String>,
    pub latest_version: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub image_created: Option<DateTime<Utc>>,
    pub last_checked: Option<DateTime<Utc>>,
    pub status: UpdateStatus,
}

/// Base fields inserted on first observation of a container
#[derive(Debug, Clone)]
pub struct NewContainer {
    pub name: String,
    pub host: String,
    pub image: String,
}

/// Outcome of one update check, applied to an existing container row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerUpdate {
    UpToDate {
        image: String,
        version: String,
        created_at: Option<DateTime<Utc>>,
        image_created: Option<DateTime<Utc>>,
    },
    UpdateAvailable {
        image: String,
        current_version: String,
        latest_version: String,
        created_at: Option<DateTime<Utc>>,
        image_created: Option<DateTime<Utc>>,
    },
    /// Versions and metadata are left as they were
    Failed { reason: String },
}

impl ContainerUpdate {
    /// Status the row ends up in after this update
    #[must_use]
    pub fn status(&self) -> UpdateStatus {
        match self {
            ContainerUpdate::UpToDate { .. } => UpdateStatus::UpToDate,
            ContainerUpdate::UpdateAvailable { .. } => UpdateStatus::UpdateAvailable,
            ContainerUpdate::Failed { reason } => UpdateStatus::Unknown {
                reason: reason.clone(),
            },
        }
    }

    /// Apply to an in-memory record, clamping `last_checked` so it never moves back
    pub fn apply(&self, record: &mut ContainerRecord, checked_at: DateTime<Utc>) {
        match self {
            ContainerUpdate::UpToDate {
                image,
                version,
                created_at,
                image_created,
            } => {
                record.image.clone_from(image);
                record.current_version = Some(version.clone());
                record.latest_version = Some(version.clone());
                record.created_at = *created_at;
                record.image_created = *image_created;
            }
            ContainerUpdate::UpdateAvailable {
                image,
                current_version,
                latest_version,
                created_at,
                image_created,
            } => {
                record.image.clone_from(image);
                record.current_version = Some(current_version.clone());
                record.latest_version = Some(latest_version.clone());
                record.created_at = *created_at;
                record.image_created = *image_created;
            }
            ContainerUpdate::Failed { .. } => {}
        }
        record.status = self.status();
        record.last_checked = Some(match record.last_checked {
            Some(previous) if previous > checked_at => previous,
            _ => checked_at,
        });
    }
}

/// Overall outcome of scanning one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Success,
    Error,
    Offline,
}

impl CheckStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Success => "success",
            CheckStatus::Error => "error",
            CheckStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(CheckStatus::Success),
            "error" => Ok(CheckStatus::Error),
            "offline" => Ok(CheckStatus::Offline),
            other => Err(StoreError::Corrupt(format!("unknown check status {other}"))),
        }
    }
}

/// Per-host result of one fleet check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCheckResult {
    pub hostname: String,
    pub total_containers: u32,
    pub up_to_date: u32,
    pub updates_available: u32,
    pub errors: u32,
    pub status: CheckStatus,
    pub error_message: Option<String>,
}

impl HostCheckResult {
    /// Successful scan, counting the given container rows
    #[must_use]
    pub fn from_records(hostname: impl Into<String>, records: &[ContainerRecord]) -> Self {
        let count = |f: fn(&UpdateStatus) -> bool| {
            u32::try_from(records.iter().filter(|r| f(&r.status)).count()).unwrap_or(u32::MAX)
        };
        Self {
            hostname: hostname.into(),
            total_containers: u32::try_from(records.len()).unwrap_or(u32::MAX),
            up_to_date: count(UpdateStatus::is_latest),
            updates_available: count(UpdateStatus::has_update),
            errors: count(UpdateStatus::is_error),
            status: CheckStatus::Success,
            error_message: None,
        }
    }

    /// Zero-count result for a host known to be offline
    #[must_use]
    pub fn offline(hostname: impl Into<String>) -> Self {
        Self::empty(hostname, CheckStatus::Offline, None)
    }

    /// Zero-count result for a scan that failed outright
    #[must_use]
    pub fn failed(hostname: impl Into<String>, error: impl Into<String>) -> Self {
        Self::empty(hostname, CheckStatus::Error, Some(error.into()))
    }

    fn empty(hostname: impl Into<String>, status: CheckStatus, error: Option<String>) -> Self {
        Self {
            hostname: hostname.into(),
            total_containers: 0,
            up_to_date: 0,
            updates_available: 0,
            errors: 0,
            status,
            error_message: error,
        }
    }

    /// Counts as shared API stats
    #[must_use]
    pub fn stats(&self) -> FleetStats {
        FleetStats {
            total_containers: self.total_containers,
            up_to_date: self.up_to_date,
            updates_available: self.updates_available,
            errors: self.errors,
        }
    }
}

/// Append-only history row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(flatten)]
    pub result: HostCheckResult,
    pub timestamp: DateTime<Utc>,
}
