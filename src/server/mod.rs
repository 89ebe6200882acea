//! # Server Module
//!
//! Delivers Joy-Con events to transport clients.
//!
//! This module handles:
//! - Tracking connected clients in a shared registry
//! - Serializing each event once and fanning it out
//! - Accepting WebSocket connections and removing them on close

pub mod hub;
pub mod websocket;

pub use hub::{BroadcastHub, ChannelClient, ClientId, ClientSink, CLIENT_QUEUE_CAPACITY};
pub use websocket::WebSocketServer;
