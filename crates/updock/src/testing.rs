//! Test fixtures: a one-container runtime and actors wired to it

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, Timelike};
use kameo::actor::Spawn;
use tokio::sync::broadcast;
use updock_core::{
    CheckConfig, DailyTime, FleetActor, FleetActorArgs, LocalHost, RuntimeFactory, ScheduleConfig,
    SchedulerActor, SchedulerActorArgs,
};
use updock_runtime::{
    ContainerDetails, ContainerSummary, ImageDetails, ImageReference, PullOutcome, RuntimeClient,
    RuntimeError,
};
use updock_store::MemoryStore;

use crate::state::AppState;

/// Runs `web` on `nginx:latest`; a pull moves the tag to a new image
#[derive(Default)]
pub struct StaleRuntime {
    pulled: Mutex<bool>,
}

#[async_trait]
impl RuntimeClient for StaleRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        Ok(vec![ContainerSummary::new("c1", "/web", "nginx:latest")])
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        Ok(ContainerDetails {
            id: id.to_string(),
            name: "web".to_string(),
            image: "nginx:latest".to_string(),
            created_at: None,
        })
    }

    async fn inspect_image(&self, _reference: &str) -> Result<ImageDetails, RuntimeError> {
        let pulled = *self.pulled.lock().unwrap();
        Ok(ImageDetails {
            id: if pulled { "sha256:new" } else { "sha256:old" }.to_string(),
            repo_digests: vec![],
            created_at: None,
        })
    }

    async fn pull_image(&self, _reference: &ImageReference) -> Result<PullOutcome, RuntimeError> {
        *self.pulled.lock().unwrap() = true;
        Ok(PullOutcome::default())
    }

    fn runtime_type(&self) -> &'static str {
        "mock"
    }
}

/// Every host runs a `StaleRuntime`
pub struct StaleFactory;

#[async_trait]
impl RuntimeFactory for StaleFactory {
    async fn local(&self) -> Result<Arc<dyn RuntimeClient>, RuntimeError> {
        Ok(Arc::new(StaleRuntime::default()))
    }

    async fn remote(
        &self,
        _hostname: &str,
        _port: u16,
    ) -> Result<Arc<dyn RuntimeClient>, RuntimeError> {
        Ok(Arc::new(StaleRuntime::default()))
    }
}

/// Actors over an in-memory store, local host `server1`
pub fn spawn_state() -> AppState {
    let (events, _) = broadcast::channel(64);
    let fleet = FleetActor::spawn(FleetActorArgs {
        store: Arc::new(MemoryStore::new()),
        factory: Arc::new(StaleFactory),
        local: LocalHost::new("server1", 2375),
        check: CheckConfig {
            probe_timeout: Duration::from_millis(500),
            ..CheckConfig::default()
        },
        event_tx: events.clone(),
    });

    // keep the daily trigger away from the test run
    let daily = DailyTime::new((Local::now().hour() + 12) % 24, 0).unwrap();
    let scheduler = SchedulerActor::spawn(SchedulerActorArgs {
        fleet: fleet.clone(),
        schedule: ScheduleConfig {
            interval_minutes: 0,
            daily,
        },
    });

    AppState::new(fleet, scheduler, events)
}
