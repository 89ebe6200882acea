//! # WebSocket Server
//!
//! Accepts transport clients and connects each one to the [`BroadcastHub`].
//!
//! Every connection gets a [`ChannelClient`] registered with the hub and a
//! task that drains it into the socket. Inbound frames are ignored apart
//! from close, which ends the connection and removes the client.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::hub::{BroadcastHub, ChannelClient};
use crate::error::Result;

/// Listening WebSocket endpoint
pub struct WebSocketServer {
    listener: TcpListener,
    hub: BroadcastHub,
}

impl std::fmt::Debug for WebSocketServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketServer")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("hub", &self.hub)
            .finish()
    }
}

impl WebSocketServer {
    /// Bind the listener
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to listen on (e.g. "127.0.0.1:8080", port 0 for any)
    /// * `hub` - Hub that connected clients are registered with
    ///
    /// # Errors
    ///
    /// Returns `Io` if the address cannot be bound
    pub async fn bind(addr: &str, hub: BroadcastHub) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, hub })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) -> Result<()> {
        info!("WebSocket server listening on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tokio::spawn(handle_connection(peer, stream, self.hub.clone()));
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

async fn handle_connection(peer: SocketAddr, stream: TcpStream, hub: BroadcastHub) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", peer, e);
            return;
        }
    };

    info!("WebSocket client connected: {}", peer);

    let (mut ws_sink, mut ws_stream) = ws.split();
    let (client, mut outbound) = ChannelClient::new();
    let id = hub.register(Arc::new(client));

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = ws_sink.send(frame).await {
                    debug!("Send to {} failed: {}", peer, e);
                    break;
                }
            }

            inbound = ws_stream.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", peer, e);
                        break;
                    }
                }
            }
        }
    }

    hub.remove(id);
    info!("WebSocket client disconnected: {}", peer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JoyconBridgeError;

    #[test]
    fn test_bind_any_port() {
        let server = tokio_test::block_on(WebSocketServer::bind("127.0.0.1:0", BroadcastHub::new()))
            .unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_bind_port_in_use() {
        tokio_test::block_on(async {
            let first = WebSocketServer::bind("127.0.0.1:0", BroadcastHub::new()).await.unwrap();
            let addr = first.local_addr().unwrap().to_string();

            let second = WebSocketServer::bind(&addr, BroadcastHub::new()).await;
            assert!(matches!(second, Err(JoyconBridgeError::Io(_))));
        });
    }

    #[tokio::test]
    async fn test_client_registered_and_removed() {
        let hub = BroadcastHub::new();
        let server = WebSocketServer::bind("127.0.0.1:0", hub.clone()).await.unwrap();
        let url = format!("ws://{}", server.local_addr().unwrap());
        tokio::spawn(server.run());

        let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        for _ in 0..200 {
            if hub.client_count() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(hub.client_count(), 1);

        ws.close(None).await.unwrap();
        for _ in 0..200 {
            if hub.client_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(hub.client_count(), 0);
    }
}
