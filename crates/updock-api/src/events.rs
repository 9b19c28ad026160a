//! WebSocket event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::responses::FleetStats;

/// What caused a fleet check to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckTrigger {
    /// Requested through the API or CLI
    Manual,
    /// Fired by the interval trigger
    Interval,
    /// Fired by the daily time-of-day trigger
    Daily,
    /// Initial check after daemon start
    Startup,
}

impl std::fmt::Display for CheckTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckTrigger::Manual => write!(f, "manual"),
            CheckTrigger::Interval => write!(f, "interval"),
            CheckTrigger::Daily => write!(f, "daily"),
            CheckTrigger::Startup => write!(f, "startup"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FleetEvent {
    UpdateCheckStarted {
        trigger: CheckTrigger,
        at: DateTime<Utc>,
    },
    UpdateCheckCompleted {
        trigger: CheckTrigger,
        stats: FleetStats,
        at: DateTime<Utc>,
    },
    UpdateCheckFailed {
        trigger: CheckTrigger,
        error: String,
        at: DateTime<Utc>,
    },
    HostRegistered {
        host: String,
    },
    HostOffline {
        host: String,
        reason: String,
    },
    HostOnline {
        host: String,
    },
}
