//! updock-client: HTTP and WebSocket client library
//!
//! Provides both HTTP and WebSocket clients for communicating with the updock daemon.
//!
//! # Examples
//!
//! ```no_run
//! use updock_api::FleetEvent;
//! use updock_client::{HttpClient, WsClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new("http://localhost:3000")?;
//!
//! // Start watching before triggering so no event is missed
//! let mut events = WsClient::connect(client.events_url()?)?;
//! let report = client.check_updates().await?;
//! println!("{} hosts checked", report.results.len());
//!
//! while let Some(event) = events.recv().await {
//!     if let FleetEvent::HostOffline { host, reason } = event {
//!         println!("{host} went offline: {reason}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod ws;

pub use error::{ClientError, Result};
pub use http::HttpClient;
pub use ws::WsClient;
