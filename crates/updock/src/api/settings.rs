//! Scheduler settings endpoints

use std::sync::Arc;

use axum::{Json, extract::State};
use updock_api::requests::CheckIntervalRequest;
use updock_api::responses::{CheckIntervalResponse, MessageResponse};
use updock_core::{GetSchedule, SetCheckInterval};

use crate::api::error::AppError;
use crate::state::AppState;

/// Current interval between checks
///
/// # Errors
/// Returns `AppError` if the scheduler is not running
#[utoipa::path(
    get,
    path = "/api/settings/check-interval",
    tag = "settings",
    responses((status = 200, description = "Interval in minutes, 0 when disabled", body = CheckIntervalResponse))
)]
pub async fn get_check_interval(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CheckIntervalResponse>, AppError> {
    let schedule = state
        .scheduler
        .ask(GetSchedule)
        .await
        .map_err(AppError::from_send)?;

    Ok(Json(CheckIntervalResponse {
        interval_minutes: schedule.interval_minutes,
    }))
}

/// Change the interval between checks; `0` disables interval checks
///
/// # Errors
/// Returns 400 for a negative or oversized interval
#[utoipa::path(
    post,
    path = "/api/settings/check-interval",
    tag = "settings",
    request_body = CheckIntervalRequest,
    responses(
        (status = 200, description = "Interval updated", body = MessageResponse),
        (status = 400, description = "Invalid interval", body = crate::api::ApiError)
    )
)]
pub async fn set_check_interval(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckIntervalRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let minutes = u32::try_from(req.interval_minutes).map_err(|_| {
        AppError::bad_request(format!(
            "invalid check interval {}: must be a non-negative number of minutes",
            req.interval_minutes
        ))
    })?;

    state
        .scheduler
        .ask(SetCheckInterval { minutes })
        .await
        .map_err(AppError::from_send)?;

    Ok(Json(MessageResponse {
        message: "Check interval updated successfully".to_string(),
    }))
}
