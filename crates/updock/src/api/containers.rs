//! Container inventory endpoint

use std::sync::Arc;

use axum::{Json, extract::State};
use updock_api::responses::ContainerInfo;
use updock_core::GetInventory;
use updock_store::ContainerRecord;

use crate::api::error::AppError;
use crate::state::AppState;

fn container_info(record: ContainerRecord) -> ContainerInfo {
    ContainerInfo {
        status: record.status.kind().to_string(),
        latest: record.status.is_latest(),
        new: record.status.has_update(),
        error: record.status.is_error(),
        error_message: record.status.error_message().map(str::to_string),
        id: record.id,
        name: record.name,
        host: record.host,
        image: record.image,
        current_version: record.current_version,
        latest_version: record.latest_version,
        created_at: record.created_at,
        image_created: record.image_created,
        last_checked: record.last_checked,
    }
}

/// Full inventory ordered by host, then name
///
/// # Errors
/// Returns `AppError` if the store cannot be read
#[utoipa::path(
    get,
    path = "/api/containers",
    tag = "containers",
    responses(
        (status = 200, description = "Container inventory", body = Vec<ContainerInfo>),
        (status = 500, description = "Store failure", body = crate::api::ApiError)
    )
)]
pub async fn list_containers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContainerInfo>>, AppError> {
    let records = state
        .fleet
        .ask(GetInventory)
        .await
        .map_err(AppError::from_send)?;

    Ok(Json(records.into_iter().map(container_info).collect()))
}
