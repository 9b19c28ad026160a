//! Actor implementations

pub mod fleet;
pub mod scheduler;

pub use fleet::{FleetActor, FleetActorArgs};
pub use scheduler::{SchedulerActor, SchedulerActorArgs};
