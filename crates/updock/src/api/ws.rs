//! WebSocket stream of fleet events

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use updock_api::FleetEvent;

use crate::state::AppState;

/// Upgrade to a WebSocket that receives every `FleetEvent` as JSON text
#[utoipa::path(
    get,
    path = "/ws/events",
    tag = "events",
    responses((status = 101, description = "Switching to WebSocket", body = FleetEvent))
)]
pub async fn events(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let rx = state.events.subscribe();
    ws.on_upgrade(move |socket| forward_events(socket, rx))
}

async fn forward_events(
    socket: WebSocket,
    mut rx: tokio::sync::broadcast::Receiver<FleetEvent>,
) {
    let (mut sink, mut stream) = socket.split();
    debug!("event subscriber connected");

    loop {
        tokio::select! {
            event = rx.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event subscriber lagging, events dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "failed to encode event");
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                // inbound frames are ignored; stop on close or error
                match incoming {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("event subscriber disconnected");
}
