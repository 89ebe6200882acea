//! # Client Connection
//!
//! Keeps a WebSocket connection to the bridge open and feeds every received
//! frame into a [`ClientStateStore`].
//!
//! ## State machine
//!
//! ```text
//! start ──────────────► Connecting
//! Connecting ──open───► Connected
//! any ────────error───► Error          (no retry by itself)
//! any ────────close───► Disconnected ──(retry interval)──► Connecting
//! any ──────reconnect─► Connecting     (closes the socket, cancels the wait)
//! ```
//!
//! Retries are unconditional: fixed interval, no growth, no limit. A clean
//! close and a failed connect are treated the same.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::store::ClientStateStore;

/// Delay between a close and the next connection attempt
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(5000);

/// Transport connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Error => "Error",
        };
        f.write_str(text)
    }
}

/// Something that happened to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt started
    Opening,
    /// The handshake completed
    Opened,
    /// The transport failed
    Failed(String),
    /// The transport closed, cleanly or not
    Closed,
    /// The consumer asked for a fresh connection
    ManualReconnect,
}

impl ConnectionEvent {
    /// State and status text this event leads to
    pub fn outcome(&self) -> (ConnectionState, String) {
        match self {
            ConnectionEvent::Opening => (ConnectionState::Connecting, "Connecting...".to_string()),
            ConnectionEvent::Opened => (ConnectionState::Connected, "Connected".to_string()),
            ConnectionEvent::Failed(reason) => (ConnectionState::Error, format!("Error: {}", reason)),
            ConnectionEvent::Closed => (ConnectionState::Disconnected, "Disconnected".to_string()),
            ConnectionEvent::ManualReconnect => {
                (ConnectionState::Connecting, "Reconnecting...".to_string())
            }
        }
    }
}

/// Why a connection attempt ended
enum Ended {
    Closed,
    ManualReconnect,
}

/// Consumer-side handle: a state store kept fed by a reconnecting connection
///
/// Must be created inside a Tokio runtime. Dropping the client stops the
/// connection task; the store stays queryable.
pub struct JoyconClient {
    store: ClientStateStore,
    reconnect: Arc<Notify>,
    task: JoinHandle<()>,
}

impl fmt::Debug for JoyconClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoyconClient")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl JoyconClient {
    /// Start connecting to `url` with the default 5s retry interval
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joycon_bridge::client::JoyconClient;
    /// use joycon_bridge::joycon::protocol::ButtonName;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = JoyconClient::connect("ws://localhost:8080");
    ///     let store = client.store();
    ///     loop {
    ///         if store.is_just_pressed(ButtonName::A, None) {
    ///             println!("A pressed");
    ///         }
    ///         store.update();
    ///         tokio::time::sleep(std::time::Duration::from_millis(16)).await;
    ///     }
    /// }
    /// ```
    pub fn connect(url: impl Into<String>) -> Self {
        Self::connect_with_store(url, DEFAULT_RECONNECT_INTERVAL, ClientStateStore::new())
    }

    /// Start connecting with an explicit retry interval and store
    ///
    /// Passing a store lets listeners be registered before the first
    /// connection event.
    pub fn connect_with_store(
        url: impl Into<String>,
        reconnect_interval: Duration,
        store: ClientStateStore,
    ) -> Self {
        let url = url.into();
        let reconnect = Arc::new(Notify::new());

        // Connecting from the moment of construction
        store.record_connection_event(ConnectionEvent::Opening);

        let task = tokio::spawn(drive(url, reconnect_interval, store.clone(), Arc::clone(&reconnect)));

        Self {
            store,
            reconnect,
            task,
        }
    }

    /// The state store this client feeds
    pub fn store(&self) -> &ClientStateStore {
        &self.store
    }

    /// Drop the current connection and connect again now
    ///
    /// Cancels a pending automatic retry.
    pub fn reconnect(&self) {
        info!("Manual reconnect requested");
        self.store.record_connection_event(ConnectionEvent::ManualReconnect);
        self.reconnect.notify_one();
    }
}

impl Drop for JoyconClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive(url: String, reconnect_interval: Duration, store: ClientStateStore, reconnect: Arc<Notify>) {
    let mut first_attempt = true;

    loop {
        if !first_attempt {
            store.record_connection_event(ConnectionEvent::Opening);
        }
        first_attempt = false;

        let ended = tokio::select! {
            () = run_connection(&url, &store) => Ended::Closed,
            () = reconnect.notified() => Ended::ManualReconnect,
        };

        if let Ended::ManualReconnect = ended {
            // Dropping the connection future closed the socket
            continue;
        }

        store.record_connection_event(ConnectionEvent::Closed);
        debug!("Retrying {} in {:?}", url, reconnect_interval);

        tokio::select! {
            () = tokio::time::sleep(reconnect_interval) => {
                info!("Reconnecting to {}...", url);
            }
            () = reconnect.notified() => {}
        }
    }
}

/// Connect once and pump frames into the store until the connection ends
async fn run_connection(url: &str, store: &ClientStateStore) {
    let (ws, _) = match connect_async(url).await {
        Ok(connected) => connected,
        Err(e) => {
            warn!("WebSocket connection to {} failed: {}", url, e);
            store.record_connection_event(ConnectionEvent::Failed(e.to_string()));
            return;
        }
    };

    info!("WebSocket connected to {}", url);
    store.record_connection_event(ConnectionEvent::Opened);

    let (_sink, mut stream) = ws.split();
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                store.apply_text(&text);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error: {}", e);
                store.record_connection_event(ConnectionEvent::Failed(e.to_string()));
                break;
            }
        }
    }

    info!("WebSocket disconnected from {}", url);
}
