//! updock daemon
//!
//! Watches the containers of a fleet of Docker hosts and reports which ones
//! run an image older than the registry's, over an axum HTTP and WebSocket API.

use std::sync::Arc;

use color_eyre::Result;
use eyre::WrapErr;
use kameo::actor::Spawn;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;
use updock_core::{FleetActor, FleetActorArgs, SchedulerActor, SchedulerActorArgs};

mod api;
mod bootstrap;
mod config;
mod factory;
mod router;
mod state;
#[cfg(test)]
mod testing;

use crate::config::{Config, DaemonConfig, LogFormat};
use crate::factory::DockerFactory;
use crate::state::AppState;

/// Capacity of the fleet event channel; slower WebSocket clients skip events
const EVENT_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load_default()?;
    init_tracing(&config.daemon);

    let store = updock_store::open(&config.store.url)
        .await
        .wrap_err_with(|| format!("failed to open store {}", config.store.url))?;
    let local = config.local_host();
    let schedule = config.schedule()?;
    let seeds = config.seed_hosts()?;
    info!(
        store = store.store_type(),
        local = %local.hostname,
        interval_minutes = schedule.interval_minutes,
        daily = %schedule.daily,
        "updock daemon starting"
    );

    let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
    let fleet = FleetActor::spawn(FleetActorArgs {
        store,
        factory: Arc::new(DockerFactory::new()),
        local: local.clone(),
        check: config.check(),
        event_tx: event_tx.clone(),
    });
    let scheduler = SchedulerActor::spawn(SchedulerActorArgs {
        fleet: fleet.clone(),
        schedule,
    });

    bootstrap::register_hosts(&fleet, &local, &seeds).await;
    bootstrap::spawn_startup_check(fleet.clone());

    let state = Arc::new(AppState::new(fleet.clone(), scheduler.clone(), event_tx));
    let app = router::create_router(state);

    let listener = TcpListener::bind(&config.daemon.bind)
        .await
        .wrap_err_with(|| format!("failed to bind {}", config.daemon.bind))?;
    info!(bind = %config.daemon.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    if let Err(e) = scheduler.stop_gracefully().await {
        tracing::warn!(error = %e, "scheduler already stopped");
    }
    if let Err(e) = fleet.stop_gracefully().await {
        tracing::warn!(error = %e, "fleet actor already stopped");
    }
    Ok(())
}

fn init_tracing(daemon: &DaemonConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&daemon.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match daemon.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
