//! API error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kameo::error::{Infallible, SendError};
use serde::{Deserialize, Serialize};
use updock_core::CoreError;
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// Wrapper for API errors with status codes
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: ApiError,
}

impl AppError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ApiError::new(code, message),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::internal(message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "HOST_UNREACHABLE", message)
    }

    /// Map a failed actor `ask`, keeping the handler's own error
    pub fn from_send<M, E>(err: SendError<M, E>) -> Self
    where
        E: Into<AppError>,
    {
        match err {
            SendError::HandlerError(e) => e.into(),
            _ => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "ACTOR_UNAVAILABLE",
                "update engine is not running",
            ),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(message) => Self::bad_request(message),
            CoreError::HostNotFound(host) => Self::new(
                StatusCode::NOT_FOUND,
                "HOST_NOT_FOUND",
                format!("host not found: {host}"),
            ),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<Infallible> for AppError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
