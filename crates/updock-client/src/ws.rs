//! WebSocket client for the updock event stream

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
};
use url::Url;

use updock_api::FleetEvent;

use crate::error::{ClientError, Result};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// WebSocket client for receiving live fleet events
#[derive(Debug)]
pub struct WsClient {
    receiver: mpsc::Receiver<FleetEvent>,
    task_handle: tokio::task::JoinHandle<()>,
}

impl WsClient {
    /// Connect to the WebSocket endpoint
    ///
    /// Reconnects on connection loss with exponential backoff, so a daemon
    /// restart does not end the stream.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    ///
    /// # Example
    /// ```no_run
    /// use updock_api::FleetEvent;
    /// use updock_client::WsClient;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut client = WsClient::connect("ws://localhost:3000/ws/events")?;
    ///
    /// while let Some(event) = client.recv().await {
    ///     if let FleetEvent::UpdateCheckCompleted { stats, .. } = event {
    ///         println!("{} updates available", stats.updates_available);
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref())?;
        let (tx, rx) = mpsc::channel(100);

        let task_handle = tokio::spawn(Self::connection_loop(url, tx));

        Ok(Self {
            receiver: rx,
            task_handle,
        })
    }

    /// Receive the next event from the stream
    ///
    /// Returns `None` once the client has been closed.
    pub async fn recv(&mut self) -> Option<FleetEvent> {
        self.receiver.recv().await
    }

    /// Stop reconnecting and drop the connection
    pub fn close(&self) {
        self.task_handle.abort();
    }

    /// Connection loop with auto-reconnection
    async fn connection_loop(url: Url, tx: mpsc::Sender<FleetEvent>) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match Self::connect_and_receive(&url, &tx, &mut backoff).await {
                Ok(()) => {
                    tracing::debug!("event receiver dropped, closing WebSocket");
                    break;
                }
                Err(e) if !e.is_retryable() => {
                    tracing::error!(error = %e, "WebSocket connection rejected, giving up");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, ?backoff, "WebSocket error, reconnecting");
                    sleep(backoff).await;
                    backoff = next_backoff(backoff);
                }
            }
        }
    }

    /// Connect and forward events until the connection fails
    ///
    /// Returns `Ok` only when the receiver has been dropped.
    async fn connect_and_receive(
        url: &Url,
        tx: &mpsc::Sender<FleetEvent>,
        backoff: &mut Duration,
    ) -> Result<()> {
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(handshake_error)?;

        tracing::info!(%url, "WebSocket connected");
        *backoff = INITIAL_BACKOFF;

        let (_write, mut read) = ws_stream.split();

        while let Some(msg) = read.next().await {
            let msg = msg.map_err(|e| ClientError::WebSocket(e.to_string()))?;

            match msg {
                Message::Text(text) => match serde_json::from_str::<FleetEvent>(&text) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to parse event");
                    }
                },
                Message::Close(_) => {
                    return Err(ClientError::ConnectionClosed(
                        "server closed connection".into(),
                    ));
                }
                // ping/pong is answered by tungstenite
                Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {}
            }
        }

        Err(ClientError::ConnectionClosed("stream ended".into()))
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}

/// A rejected upgrade carries the HTTP status, so a 4xx stops reconnection
fn handshake_error(err: WsError) -> ClientError {
    match err {
        WsError::Http(response) => ClientError::Api {
            status: response.status().as_u16(),
            message: "WebSocket upgrade rejected".to_string(),
        },
        other => ClientError::WebSocket(other.to_string()),
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}
