//! HTTP client for the updock daemon

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use updock_api::{
    requests::{CheckIntervalRequest, RegisterHostRequest},
    responses::{
        CheckIntervalResponse, CheckUpdatesResponse, ContainerInfo, HealthResponse, HistoryRecord,
        HostInfo, MessageResponse,
    },
};

use crate::error::{ClientError, Result};

/// HTTP client for communicating with the updock daemon
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new HTTP client
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    ///
    /// # Example
    /// ```no_run
    /// use updock_client::HttpClient;
    ///
    /// let client = HttpClient::new("http://localhost:3000")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Create a new HTTP client with custom `reqwest::Client`
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn with_client(base_url: impl AsRef<str>, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self { client, base_url })
    }

    /// Build a full URL from a path
    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(ClientError::Url)
    }

    /// WebSocket URL of the event stream on the same daemon
    ///
    /// # Errors
    /// Returns an error if the base URL has a scheme other than http(s).
    pub fn events_url(&self) -> Result<Url> {
        let mut url = self.url("/ws/events")?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(ClientError::WebSocket(format!(
                    "cannot derive a WebSocket URL from scheme {other}"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| ClientError::WebSocket(format!("invalid scheme {scheme}")))?;
        Ok(url)
    }

    /// Turn a non-success response into `ClientError::Api`
    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            // daemon errors are {"code", "message"}; fall back to the raw body
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(ClientError::Api { status, message });
        }

        Ok(response.json().await?)
    }

    /// Perform a GET request and deserialize the response
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let response = self.client.get(url).send().await?;
        Self::parse(response).await
    }

    /// Perform a POST request with JSON body
    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl serde::Serialize,
    ) -> Result<T> {
        let url = self.url(path)?;
        let response = self.client.post(url).json(&body).send().await?;
        Self::parse(response).await
    }

    // System endpoints

    /// Get daemon health status
    ///
    /// # Errors
    /// Returns an error if the request fails or the daemon returns an error.
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/health").await
    }

    // Inventory and checks

    /// Full container inventory, ordered by host then name
    ///
    /// # Errors
    /// Returns an error if the request fails or the daemon returns an error.
    pub async fn list_containers(&self) -> Result<Vec<ContainerInfo>> {
        self.get("/api/containers").await
    }

    /// Run a fleet check and wait for the result
    ///
    /// # Errors
    /// Returns an error if the request fails or the daemon returns an error.
    ///
    /// # Example
    /// ```no_run
    /// # use updock_client::HttpClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = HttpClient::new("http://localhost:3000")?;
    /// let report = client.check_updates().await?;
    /// println!("{} updates available", report.stats.updates_available);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn check_updates(&self) -> Result<CheckUpdatesResponse> {
        self.post("/api/check-updates", serde_json::json!({})).await
    }

    /// Most recent check history, newest first
    ///
    /// `None` uses the daemon's default of 10 rows.
    ///
    /// # Errors
    /// Returns an error if the request fails or the daemon returns an error.
    pub async fn update_history(&self, limit: Option<u32>) -> Result<Vec<HistoryRecord>> {
        let mut url = self.url("/api/update-history")?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        let response = self.client.get(url).send().await?;
        Self::parse(response).await
    }

    // Host endpoints

    /// List all registered hosts
    ///
    /// # Errors
    /// Returns an error if the request fails or the daemon returns an error.
    pub async fn list_hosts(&self) -> Result<Vec<HostInfo>> {
        self.get("/api/hosts").await
    }

    /// Probe and register a host
    ///
    /// # Errors
    /// Returns `ClientError::Api` with status 502 if the daemon cannot reach
    /// the host.
    ///
    /// # Example
    /// ```no_run
    /// # use updock_client::HttpClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = HttpClient::new("http://localhost:3000")?;
    /// client.add_host("nas", 2375).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add_host(&self, hostname: &str, port: u16) -> Result<MessageResponse> {
        let request = RegisterHostRequest {
            hostname: hostname.to_string(),
            port,
        };
        self.post("/api/hosts", request).await
    }

    /// Re-probe an offline host
    ///
    /// # Errors
    /// Returns `ClientError::Api` with status 404 for an unknown host or 502
    /// if it is still unreachable.
    pub async fn reconnect_host(&self, hostname: &str) -> Result<MessageResponse> {
        self.post(
            &format!("/api/hosts/{hostname}/reconnect"),
            serde_json::json!({}),
        )
        .await
    }

    // Settings

    /// Current interval between checks in minutes, 0 when disabled
    ///
    /// # Errors
    /// Returns an error if the request fails or the daemon returns an error.
    pub async fn check_interval(&self) -> Result<CheckIntervalResponse> {
        self.get("/api/settings/check-interval").await
    }

    /// Change the interval between checks
    ///
    /// # Errors
    /// Returns `ClientError::Api` with status 400 for a negative interval.
    pub async fn set_check_interval(&self, minutes: i64) -> Result<MessageResponse> {
        let request = CheckIntervalRequest {
            interval_minutes: minutes,
        };
        self.post("/api/settings/check-interval", request).await
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use updock_api::requests::HistoryQuery;

    use super::*;

    async fn serve(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new("http://localhost:3000");
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = HttpClient::new("not a url");
        assert!(client.is_err());
    }

    #[test]
    fn test_url_building() {
        let client = HttpClient::new("http://localhost:3000").unwrap();
        let url = client.url("/api/hosts").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/hosts");
    }

    #[test]
    fn test_events_url() {
        let client = HttpClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.events_url().unwrap().as_str(),
            "ws://localhost:3000/ws/events"
        );

        let client = HttpClient::new("https://updock.example.com").unwrap();
        assert_eq!(
            client.events_url().unwrap().as_str(),
            "wss://updock.example.com/ws/events"
        );
    }

    #[tokio::test]
    async fn test_history_sends_limit() {
        let app = Router::new().route(
            "/api/update-history",
            get(|Query(q): Query<HistoryQuery>| async move {
                assert_eq!(q.limit, Some(3));
                Json(json!([{
                    "id": 1,
                    "hostname": "nas",
                    "total_containers": 4,
                    "up_to_date": 3,
                    "updates_available": 1,
                    "errors": 0,
                    "status": "success",
                    "error_message": null,
                    "timestamp": "2024-03-01T04:00:00Z"
                }]))
            }),
        );
        let addr = serve(app).await;

        let client = HttpClient::new(format!("http://{addr}")).unwrap();
        let history = client.update_history(Some(3)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].summary.updates_available, 1);
    }

    #[tokio::test]
    async fn test_error_body_message_is_extracted() {
        let app = Router::new().route(
            "/api/hosts",
            post(|Json(_body): Json<Value>| async {
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"code": "HOST_UNREACHABLE", "message": "could not connect to nas:2375"})),
                )
            }),
        );
        let addr = serve(app).await;

        let client = HttpClient::new(format!("http://{addr}")).unwrap();
        match client.add_host("nas", 2375).await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "could not connect to nas:2375");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
