//! updock-api: Shared API types and schemas
//!
//! Contains request/response types, event types, and OpenAPI schema definitions
//! used across the daemon, client, and CLI.

pub mod events;
pub mod requests;
pub mod responses;

pub use events::{CheckTrigger, FleetEvent};
pub use responses::FleetStats;
