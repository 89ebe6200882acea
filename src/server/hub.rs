//! # Broadcast Hub
//!
//! Fans transport messages out to every connected client.
//!
//! Each message is serialized once and handed to every open client. Clients
//! that are closed but not yet removed are skipped, and a failed send is
//! logged and dropped; nothing propagates back to the device session.
//!
//! Outbound queues are bounded. A client that stops reading misses frames
//! once its queue is full instead of holding them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace};

use crate::error::{JoyconBridgeError, Result};
use crate::message::TransportMessage;

/// Identifier assigned to a client on registration
pub type ClientId = u64;

/// Outbound side of one transport connection
pub trait ClientSink: Send + Sync {
    /// Whether the connection can still accept frames
    fn is_open(&self) -> bool;

    /// Queue one text frame for delivery
    fn send_text(&self, text: &str) -> Result<()>;
}

/// Frames queued per client before further frames are dropped
pub const CLIENT_QUEUE_CAPACITY: usize = 256;

/// Client backed by a bounded channel drained by the connection task
#[derive(Debug, Clone)]
pub struct ChannelClient {
    tx: mpsc::Sender<Message>,
}

impl ChannelClient {
    /// Create a client and the receiver its connection task drains
    pub fn new() -> (Self, mpsc::Receiver<Message>) {
        Self::with_capacity(CLIENT_QUEUE_CAPACITY)
    }

    /// Create a client whose queue holds at most `capacity` frames
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl ClientSink for ChannelClient {
    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send_text(&self, text: &str) -> Result<()> {
        self.tx
            .try_send(Message::Text(text.to_string()))
            .map_err(|e| match e {
                TrySendError::Full(_) => {
                    JoyconBridgeError::Transport("client queue full, frame dropped".to_string())
                }
                TrySendError::Closed(_) => {
                    JoyconBridgeError::Transport("client channel closed".to_string())
                }
            })
    }
}

#[derive(Default)]
struct HubInner {
    next_id: ClientId,
    clients: HashMap<ClientId, Arc<dyn ClientSink>>,
}

/// Registry of connected clients
///
/// Cloning is cheap; all clones share the same registry.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    inner: Arc<Mutex<HubInner>>,
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("clients", &self.client_count())
            .finish_non_exhaustive()
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a client and return its id
    pub fn register(&self, client: Arc<dyn ClientSink>) -> ClientId {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.clients.insert(id, client);
        debug!("Registered client {} ({} connected)", id, inner.clients.len());
        id
    }

    /// Remove a client, returning whether it was registered
    pub fn remove(&self, id: ClientId) -> bool {
        let mut inner = self.lock();
        let removed = inner.clients.remove(&id).is_some();
        if removed {
            debug!("Removed client {} ({} connected)", id, inner.clients.len());
        }
        removed
    }

    /// Number of registered clients, open or not
    pub fn client_count(&self) -> usize {
        self.lock().clients.len()
    }

    /// Send one message to every open client
    ///
    /// # Returns
    ///
    /// * `usize` - Number of clients the frame was queued for
    pub fn broadcast(&self, message: &TransportMessage) -> usize {
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode {:?}: {}", message, e);
                return 0;
            }
        };

        // Snapshot so sends happen without holding the registry lock
        let clients: Vec<(ClientId, Arc<dyn ClientSink>)> = self
            .lock()
            .clients
            .iter()
            .map(|(id, client)| (*id, Arc::clone(client)))
            .collect();

        let mut delivered = 0;
        for (id, client) in clients {
            if !client.is_open() {
                trace!("Skipping closed client {}", id);
                continue;
            }
            match client.send_text(&text) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Send to client {} failed: {}", id, e),
            }
        }

        trace!("Broadcast {} to {} client(s)", text, delivered);
        delivered
    }
}
