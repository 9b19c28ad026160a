//! `FleetActor`: single entry point to the update engine
//!
//! Owns the host registry and fleet coordinator. The mailbox runs one message
//! at a time, so fleet checks never overlap.

use std::sync::Arc;

use chrono::Utc;
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::sync::broadcast;
use tracing::{error, info};

use updock_api::FleetEvent;
use updock_store::{ContainerRecord, HistoryEntry, Host, Store};

use crate::config::{CheckConfig, LocalHost};
use crate::coordinator::FleetCoordinator;
use crate::detector::UpdateDetector;
use crate::error::CoreError;
use crate::message::{
    FleetCheckReport, GetHistory, GetInventory, ListHosts, ReconnectHost, RegisterHost,
    RunFleetCheck,
};
use crate::registry::{HostRegistry, RuntimeFactory};
use crate::scanner::HostScanner;

/// Arguments for spawning a `FleetActor`
pub struct FleetActorArgs {
    /// Inventory and history store
    pub store: Arc<dyn Store>,
    /// Factory for runtime handles
    pub factory: Arc<dyn RuntimeFactory>,
    /// Identity of the local host
    pub local: LocalHost,
    /// Probe and scan tuning
    pub check: CheckConfig,
    /// Event broadcast sender for WebSocket
    pub event_tx: broadcast::Sender<FleetEvent>,
}

pub struct FleetActor {
    coordinator: FleetCoordinator,
    event_tx: broadcast::Sender<FleetEvent>,
}

impl FleetActor {
    fn registry(&self) -> &HostRegistry {
        self.coordinator.registry()
    }

    fn emit(&self, event: FleetEvent) {
        // no subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

impl Actor for FleetActor {
    type Args = FleetActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(
            id = %actor_ref.id(),
            store = args.store.store_type(),
            local = %args.local.hostname,
            "FleetActor starting"
        );

        let registry = Arc::new(HostRegistry::new(
            Arc::clone(&args.store),
            args.factory,
            args.local,
            args.check.probe_timeout,
        ));
        let scanner = Arc::new(HostScanner::new(
            Arc::clone(&registry),
            UpdateDetector::new(Arc::clone(&args.store), args.check.registry_lookup),
            Arc::clone(&args.store),
            args.event_tx.clone(),
        ));
        let coordinator = FleetCoordinator::new(
            registry,
            scanner,
            args.store,
            args.check.host_scan_timeout,
        );

        Ok(Self {
            coordinator,
            event_tx: args.event_tx,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, "FleetActor stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<RegisterHost> for FleetActor {
    type Reply = Result<bool, CoreError>;

    async fn handle(
        &mut self,
        msg: RegisterHost,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let registered = self.registry().register(&msg.hostname, msg.port).await?;
        if registered {
            self.emit(FleetEvent::HostRegistered {
                host: msg.hostname,
            });
        }
        Ok(registered)
    }
}

impl Message<ReconnectHost> for FleetActor {
    type Reply = Result<bool, CoreError>;

    async fn handle(
        &mut self,
        msg: ReconnectHost,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let online = self.registry().reconnect(&msg.hostname).await?;
        if online {
            self.emit(FleetEvent::HostOnline {
                host: msg.hostname,
            });
        }
        Ok(online)
    }
}

impl Message<ListHosts> for FleetActor {
    type Reply = Result<Vec<Host>, CoreError>;

    async fn handle(
        &mut self,
        _msg: ListHosts,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.registry().list().await
    }
}

impl Message<RunFleetCheck> for FleetActor {
    type Reply = Result<FleetCheckReport, CoreError>;

    async fn handle(
        &mut self,
        msg: RunFleetCheck,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let trigger = msg.trigger;
        info!(%trigger, "update check started");
        self.emit(FleetEvent::UpdateCheckStarted {
            trigger,
            at: Utc::now(),
        });

        match self.coordinator.check_all().await {
            Ok(results) => {
                let report = FleetCheckReport::new(results);
                info!(
                    %trigger,
                    total = report.stats.total_containers,
                    updates_available = report.stats.updates_available,
                    errors = report.stats.errors,
                    "update check completed"
                );
                self.emit(FleetEvent::UpdateCheckCompleted {
                    trigger,
                    stats: report.stats,
                    at: Utc::now(),
                });
                Ok(report)
            }
            Err(e) => {
                error!(%trigger, error = %e, "update check failed");
                self.emit(FleetEvent::UpdateCheckFailed {
                    trigger,
                    error: e.to_string(),
                    at: Utc::now(),
                });
                Err(e)
            }
        }
    }
}

impl Message<GetInventory> for FleetActor {
    type Reply = Result<Vec<ContainerRecord>, CoreError>;

    async fn handle(
        &mut self,
        _msg: GetInventory,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.coordinator.store().list_containers().await?)
    }
}

impl Message<GetHistory> for FleetActor {
    type Reply = Result<Vec<HistoryEntry>, CoreError>;

    async fn handle(
        &mut self,
        msg: GetHistory,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.coordinator.store().recent_history(msg.limit).await?)
    }
}
