//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use kameo_macros::Reply;
use serde::{Deserialize, Serialize};

use updock_api::{CheckTrigger, FleetStats};
use updock_store::HostCheckResult;

// ============================================================================
// FleetActor Messages
// ============================================================================

/// Probe and register a host
#[derive(Debug)]
pub struct RegisterHost {
    pub hostname: String,
    pub port: u16,
}

/// Re-probe a known host and bring it back online
#[derive(Debug)]
pub struct ReconnectHost {
    pub hostname: String,
}

/// List all registered hosts
#[derive(Debug)]
pub struct ListHosts;

/// Run a fleet-wide update check
#[derive(Debug)]
pub struct RunFleetCheck {
    pub trigger: CheckTrigger,
}

/// Outcome of one fleet check
#[derive(Debug, Clone, Serialize, Deserialize, Reply)]
pub struct FleetCheckReport {
    /// Per-host results
    pub results: Vec<HostCheckResult>,
    /// Sum over all hosts
    pub stats: FleetStats,
}

impl FleetCheckReport {
    #[must_use]
    pub fn new(results: Vec<HostCheckResult>) -> Self {
        let stats = results.iter().map(HostCheckResult::stats).sum();
        Self { results, stats }
    }
}

/// Full container inventory
#[derive(Debug)]
pub struct GetInventory;

/// Most recent check history rows
#[derive(Debug)]
pub struct GetHistory {
    pub limit: u32,
}

// ============================================================================
// SchedulerActor Messages
// ============================================================================

/// Reconfigure the interval trigger; `0` disables it
#[derive(Debug)]
pub struct SetCheckInterval {
    pub minutes: u32,
}

/// Current schedule
#[derive(Debug)]
pub struct GetSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Reply)]
pub struct ScheduleStatus {
    /// Minutes between interval checks, `0` when disabled
    pub interval_minutes: u32,
    pub daily_hour: u32,
    pub daily_minute: u32,
}
