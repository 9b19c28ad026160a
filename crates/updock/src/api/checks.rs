//! Update check and history endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use updock_api::CheckTrigger;
use updock_api::requests::HistoryQuery;
use updock_api::responses::{CheckUpdatesResponse, HistoryRecord, HostCheckSummary};
use updock_core::{GetHistory, RunFleetCheck};
use updock_store::{HistoryEntry, HostCheckResult};

use crate::api::error::AppError;
use crate::state::AppState;

/// Rows returned by the history endpoint when no limit is given
const DEFAULT_HISTORY_LIMIT: u32 = 10;

fn check_summary(result: HostCheckResult) -> HostCheckSummary {
    HostCheckSummary {
        status: result.status.as_str().to_string(),
        hostname: result.hostname,
        total_containers: result.total_containers,
        up_to_date: result.up_to_date,
        updates_available: result.updates_available,
        errors: result.errors,
        error_message: result.error_message,
    }
}

fn history_record(entry: HistoryEntry) -> HistoryRecord {
    HistoryRecord {
        id: entry.id,
        summary: check_summary(entry.result),
        timestamp: entry.timestamp,
    }
}

/// Run a fleet-wide update check and wait for it
///
/// # Errors
/// Returns `AppError` if the check cannot run
#[utoipa::path(
    post,
    path = "/api/check-updates",
    tag = "checks",
    responses(
        (status = 200, description = "Check completed", body = CheckUpdatesResponse),
        (status = 500, description = "Check failed", body = crate::api::ApiError)
    )
)]
pub async fn check_updates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CheckUpdatesResponse>, AppError> {
    let report = state
        .fleet
        .ask(RunFleetCheck {
            trigger: CheckTrigger::Manual,
        })
        .await
        .map_err(AppError::from_send)?;

    Ok(Json(CheckUpdatesResponse {
        message: "Update check completed".to_string(),
        results: report.results.into_iter().map(check_summary).collect(),
        stats: report.stats,
    }))
}

/// Most recent check history, newest first
///
/// # Errors
/// Returns `AppError` if the store cannot be read
#[utoipa::path(
    get,
    path = "/api/update-history",
    tag = "checks",
    params(("limit" = Option<u32>, Query, description = "Maximum rows, default 10")),
    responses(
        (status = 200, description = "History rows", body = Vec<HistoryRecord>),
        (status = 500, description = "Store failure", body = crate::api::ApiError)
    )
)]
pub async fn update_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRecord>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let entries = state
        .fleet
        .ask(GetHistory { limit })
        .await
        .map_err(AppError::from_send)?;

    Ok(Json(entries.into_iter().map(history_record).collect()))
}
