//! Request types for the API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default Docker API port of a remote host
pub const DEFAULT_RUNTIME_PORT: u16 = 2375;

fn default_port() -> u16 {
    DEFAULT_RUNTIME_PORT
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterHostRequest {
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Signed on purpose: negative values must reach the handler to be rejected
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckIntervalRequest {
    pub interval_minutes: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}
