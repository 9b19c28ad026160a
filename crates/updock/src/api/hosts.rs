//! Host management API endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use updock_api::requests::RegisterHostRequest;
use updock_api::responses::{HostInfo, MessageResponse};
use updock_core::{ListHosts, ReconnectHost, RegisterHost};
use updock_store::Host;

use crate::api::error::AppError;
use crate::state::AppState;

fn host_info(host: Host) -> HostInfo {
    HostInfo {
        status: host.status.as_str().to_string(),
        hostname: host.hostname,
        port: host.port,
        created_at: host.created_at,
    }
}

/// List all registered hosts
///
/// # Errors
/// Returns `AppError` if the store cannot be read
#[utoipa::path(
    get,
    path = "/api/hosts",
    tag = "hosts",
    responses((status = 200, description = "Registered hosts", body = Vec<HostInfo>))
)]
pub async fn list_hosts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HostInfo>>, AppError> {
    let hosts = state
        .fleet
        .ask(ListHosts)
        .await
        .map_err(AppError::from_send)?;

    Ok(Json(hosts.into_iter().map(host_info).collect()))
}

/// Probe and register a host
///
/// # Errors
/// Returns 502 if the host does not answer the probe
#[utoipa::path(
    post,
    path = "/api/hosts",
    tag = "hosts",
    request_body = RegisterHostRequest,
    responses(
        (status = 201, description = "Host registered", body = MessageResponse),
        (status = 502, description = "Host unreachable", body = crate::api::ApiError)
    )
)]
pub async fn register_host(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterHostRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let hostname = req.hostname.trim().to_string();
    if hostname.is_empty() {
        return Err(AppError::bad_request("hostname must not be empty"));
    }

    let registered = state
        .fleet
        .ask(RegisterHost {
            hostname: hostname.clone(),
            port: req.port,
        })
        .await
        .map_err(AppError::from_send)?;

    if !registered {
        return Err(AppError::unreachable(format!(
            "could not connect to {hostname}:{}",
            req.port
        )));
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Host {hostname} added successfully"),
        }),
    ))
}

/// Re-probe a known host and bring it back online
///
/// # Errors
/// Returns 404 for an unknown host, 502 if the probe fails
#[utoipa::path(
    post,
    path = "/api/hosts/{hostname}/reconnect",
    tag = "hosts",
    params(("hostname" = String, Path, description = "Registered hostname")),
    responses(
        (status = 200, description = "Host online", body = MessageResponse),
        (status = 404, description = "Unknown host", body = crate::api::ApiError),
        (status = 502, description = "Host unreachable", body = crate::api::ApiError)
    )
)]
pub async fn reconnect_host(
    State(state): State<Arc<AppState>>,
    Path(hostname): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let online = state
        .fleet
        .ask(ReconnectHost {
            hostname: hostname.clone(),
        })
        .await
        .map_err(AppError::from_send)?;

    if !online {
        return Err(AppError::unreachable(format!(
            "{hostname} is still unreachable"
        )));
    }

    Ok(Json(MessageResponse {
        message: format!("Host {hostname} is online"),
    }))
}
