//! HTTP router configuration

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api::{checks, containers, hosts, settings, system, ws};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(title = "updock", description = "Container image update detection"),
    paths(
        system::health,
        containers::list_containers,
        checks::check_updates,
        checks::update_history,
        hosts::list_hosts,
        hosts::register_host,
        hosts::reconnect_host,
        settings::get_check_interval,
        settings::set_check_interval,
        ws::events,
    ),
    components(schemas(
        crate::api::ApiError,
        updock_api::FleetEvent,
        updock_api::CheckTrigger,
        updock_api::FleetStats,
        updock_api::requests::RegisterHostRequest,
        updock_api::requests::CheckIntervalRequest,
        updock_api::responses::HealthResponse,
        updock_api::responses::MessageResponse,
        updock_api::responses::CheckIntervalResponse,
        updock_api::responses::ContainerInfo,
        updock_api::responses::HostInfo,
        updock_api::responses::HostCheckSummary,
        updock_api::responses::HistoryRecord,
        updock_api::responses::CheckUpdatesResponse,
    ))
)]
pub struct ApiDoc;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // System endpoints
        .route("/health", get(system::health))
        // Inventory and checks
        .route("/api/containers", get(containers::list_containers))
        .route("/api/check-updates", post(checks::check_updates))
        .route("/api/update-history", get(checks::update_history))
        // Hosts
        .route("/api/hosts", get(hosts::list_hosts).post(hosts::register_host))
        .route("/api/hosts/{hostname}/reconnect", post(hosts::reconnect_host))
        // Settings
        .route(
            "/api/settings/check-interval",
            get(settings::get_check_interval).post(settings::set_check_interval),
        )
        // Live events
        .route("/ws/events", get(ws::events))
        // State
        .with_state(state)
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use futures::StreamExt;
    use kameo::actor::ActorRef;
    use serde_json::{Value, json};
    use tokio::net::TcpListener;
    use updock_core::{FleetActor, SchedulerActor};

    use super::*;
    use crate::testing::spawn_state;

    async fn serve(state: AppState) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(Arc::new(state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn stop(fleet: ActorRef<FleetActor>, scheduler: ActorRef<SchedulerActor>) {
        scheduler.stop_gracefully().await.unwrap();
        fleet.stop_gracefully().await.unwrap();
    }

    #[tokio::test]
    async fn test_health() {
        let state = spawn_state();
        let (fleet, scheduler) = (state.fleet.clone(), state.scheduler.clone());
        let addr = serve(state).await;

        let body: Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");

        stop(fleet, scheduler).await;
    }

    #[tokio::test]
    async fn test_check_updates_and_inventory() {
        let state = spawn_state();
        let (fleet, scheduler) = (state.fleet.clone(), state.scheduler.clone());
        let addr = serve(state).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{addr}/api/check-updates"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Update check completed");
        assert_eq!(body["stats"]["total_containers"], 1);
        assert_eq!(body["stats"]["updates_available"], 1);
        assert_eq!(body["results"][0]["status"], "success");

        let inventory: Value = client
            .get(format!("http://{addr}/api/containers"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(inventory[0]["name"], "web");
        assert_eq!(inventory[0]["status"], "update_available");
        assert_eq!(inventory[0]["new"], true);
        assert_eq!(inventory[0]["latest"], false);

        let history: Value = client
            .get(format!("http://{addr}/api/update-history?limit=5"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["hostname"], "server1");

        stop(fleet, scheduler).await;
    }

    #[tokio::test]
    async fn test_register_unreachable_host_is_bad_gateway() {
        let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = closed.local_addr().unwrap().port();
        drop(closed);

        let state = spawn_state();
        let (fleet, scheduler) = (state.fleet.clone(), state.scheduler.clone());
        let addr = serve(state).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{addr}/api/hosts"))
            .json(&json!({ "hostname": "127.0.0.1", "port": port }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 502);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "HOST_UNREACHABLE");

        let response = client
            .post(format!("http://{addr}/api/hosts/nas/reconnect"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        stop(fleet, scheduler).await;
    }

    #[tokio::test]
    async fn test_register_host_created() {
        let open = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = open.local_addr().unwrap().port();

        let state = spawn_state();
        let (fleet, scheduler) = (state.fleet.clone(), state.scheduler.clone());
        let addr = serve(state).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{addr}/api/hosts"))
            .json(&json!({ "hostname": "127.0.0.1", "port": port }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);

        let hosts: Value = client
            .get(format!("http://{addr}/api/hosts"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(hosts[0]["hostname"], "127.0.0.1");
        assert_eq!(hosts[0]["status"], "online");

        stop(fleet, scheduler).await;
    }

    #[tokio::test]
    async fn test_check_interval_settings() {
        let state = spawn_state();
        let (fleet, scheduler) = (state.fleet.clone(), state.scheduler.clone());
        let addr = serve(state).await;
        let client = reqwest::Client::new();
        let url = format!("http://{addr}/api/settings/check-interval");

        let response = client
            .post(&url)
            .json(&json!({ "intervalMinutes": -5 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = client
            .post(&url)
            .json(&json!({ "intervalMinutes": 30 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
        assert_eq!(body["intervalMinutes"], 30);

        stop(fleet, scheduler).await;
    }

    #[tokio::test]
    async fn test_events_websocket() {
        let state = spawn_state();
        let (fleet, scheduler) = (state.fleet.clone(), state.scheduler.clone());
        let addr = serve(state).await;

        let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/events"))
            .await
            .unwrap();

        reqwest::Client::new()
            .post(format!("http://{addr}/api/check-updates"))
            .send()
            .await
            .unwrap();

        let frame = socket.next().await.unwrap().unwrap();
        let event: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        assert_eq!(event["type"], "update-check-started");
        assert_eq!(event["trigger"], "manual");

        stop(fleet, scheduler).await;
    }

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/check-updates"));
        assert!(doc.paths.paths.contains_key("/api/hosts/{hostname}/reconnect"));
    }
}
