//! Error types for the updock client

use thiserror::Error;

/// Errors that can occur when using the updock client
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// API returned an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from server
        message: String,
    },

    /// Connection closed unexpectedly
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),
}

impl ClientError {
    /// Whether retrying the same request could succeed
    ///
    /// Transport failures and 5xx responses are retryable; client errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_connect() || e.is_timeout(),
            ClientError::WebSocket(_) | ClientError::ConnectionClosed(_) => true,
            ClientError::Api { status, .. } => *status >= 500,
            ClientError::Json(_) | ClientError::Url(_) => false,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_retryable_on_5xx() {
        let bad_gateway = ClientError::Api {
            status: 502,
            message: "unreachable".to_string(),
        };
        assert!(bad_gateway.is_retryable());

        let bad_request = ClientError::Api {
            status: 400,
            message: "negative interval".to_string(),
        };
        assert!(!bad_request.is_retryable());
    }
}
