//! Application state shared across HTTP handlers

use kameo::actor::ActorRef;
use tokio::sync::broadcast;
use updock_api::FleetEvent;
use updock_core::{FleetActor, SchedulerActor};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Runs checks and owns the inventory
    pub fleet: ActorRef<FleetActor>,
    /// Owns the check triggers
    pub scheduler: ActorRef<SchedulerActor>,
    /// Fleet event broadcaster, subscribed per WebSocket
    pub events: broadcast::Sender<FleetEvent>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        fleet: ActorRef<FleetActor>,
        scheduler: ActorRef<SchedulerActor>,
        events: broadcast::Sender<FleetEvent>,
    ) -> Self {
        Self {
            fleet,
            scheduler,
            events,
        }
    }
}
