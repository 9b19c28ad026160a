//! Startup host registration

use kameo::actor::ActorRef;
use tracing::{info, warn};
use updock_api::CheckTrigger;
use updock_core::{FleetActor, LocalHost, RegisterHost, RunFleetCheck, SeedHost};

/// Register the local host and any configured remote hosts
///
/// Failures are logged and skipped; a host that is down at startup can be
/// added later through the API.
pub async fn register_hosts(fleet: &ActorRef<FleetActor>, local: &LocalHost, seeds: &[SeedHost]) {
    register(fleet, &local.hostname, local.port).await;

    for seed in seeds {
        if local.is_local(&seed.hostname) {
            info!(host = %seed.hostname, "skipping remote entry for the local host");
            continue;
        }
        register(fleet, &seed.hostname, seed.port).await;
    }
}

async fn register(fleet: &ActorRef<FleetActor>, hostname: &str, port: u16) {
    let msg = RegisterHost {
        hostname: hostname.to_string(),
        port,
    };
    match fleet.ask(msg).await {
        Ok(true) => info!(host = %hostname, port, "host registered at startup"),
        Ok(false) => warn!(host = %hostname, port, "host unreachable at startup, not registered"),
        Err(e) => warn!(host = %hostname, port, error = %e, "failed to register host"),
    }
}

/// Run the first fleet check without holding up startup
pub fn spawn_startup_check(fleet: ActorRef<FleetActor>) {
    tokio::spawn(async move {
        if let Err(e) = fleet
            .ask(RunFleetCheck {
                trigger: CheckTrigger::Startup,
            })
            .await
        {
            warn!(error = %e, "startup update check failed");
        }
    });
}
