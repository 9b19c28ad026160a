//! updock-core: Fleet update-detection engine
//!
//! Host registry, update detector, host scanner, fleet coordinator and the
//! kameo actors that schedule and serialise fleet checks.

pub mod actor;
pub mod config;
pub mod coordinator;
pub mod detector;
pub mod error;
pub mod message;
pub mod registry;
pub mod scanner;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use actor::fleet::{FleetActor, FleetActorArgs};
pub use actor::scheduler::{SchedulerActor, SchedulerActorArgs};
pub use config::{
    CheckConfig, DEFAULT_RUNTIME_PORT, DailyTime, LocalHost, ScheduleConfig, SeedHost,
    parse_host_list,
};
pub use coordinator::FleetCoordinator;
pub use detector::UpdateDetector;
pub use error::CoreError;
pub use message::{
    FleetCheckReport, GetHistory, GetInventory, GetSchedule, ListHosts, ReconnectHost,
    RegisterHost, RunFleetCheck, ScheduleStatus, SetCheckInterval,
};
pub use registry::{HostRegistry, RuntimeFactory};
pub use scanner::HostScanner;
