//! System endpoints

use axum::Json;
use updock_api::responses::HealthResponse;

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Daemon is running", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
