//! Response types for the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Aggregate container counts across one or more hosts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FleetStats {
    pub total_containers: u32,
    pub up_to_date: u32,
    pub updates_available: u32,
    pub errors: u32,
}

impl FleetStats {
    /// Add another set of counts to this one
    pub fn absorb(&mut self, other: FleetStats) {
        self.total_containers += other.total_containers;
        self.up_to_date += other.up_to_date;
        self.updates_available += other.updates_available;
        self.errors += other.errors;
    }
}

impl std::iter::Sum for FleetStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(FleetStats::default(), |mut acc, s| {
            acc.absorb(s);
            acc
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckIntervalResponse {
    pub interval_minutes: u32,
}

/// One inventory row
///
/// `latest`, `new` and `error` are flag views of `status`, kept for clients
/// that predate the status field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContainerInfo {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub image: String,
    pub current_version: Option<String>,
    pub latest_version: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub image_created: Option<DateTime<Utc>>,
    pub last_checked: Option<DateTime<Utc>>,
    /// `pending`, `up_to_date`, `update_available` or `unknown`
    pub status: String,
    pub latest: bool,
    pub new: bool,
    pub error: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HostInfo {
    pub hostname: String,
    pub port: u16,
    /// `online` or `offline`
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Per-host outcome of a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HostCheckSummary {
    pub hostname: String,
    pub total_containers: u32,
    pub up_to_date: u32,
    pub updates_available: u32,
    pub errors: u32,
    /// `success`, `error` or `offline`
    pub status: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckUpdatesResponse {
    pub message: String,
    pub results: Vec<HostCheckSummary>,
    /// Sum over `results`
    pub stats: FleetStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryRecord {
    pub id: i64,
    #[serde(flatten)]
    pub summary: HostCheckSummary,
    pub timestamp: DateTime<Utc>,
}
