//! # Client Module
//!
//! Consumer side of the bridge.
//!
//! This module handles:
//! - Keeping a WebSocket connection open with a fixed retry interval
//! - Double-buffered button state for level and edge queries
//! - Momentary stick angles that expire without fresh samples
//! - Press/release and connection-change listeners

pub mod connection;
pub mod store;

pub use connection::{ConnectionEvent, ConnectionState, JoyconClient, DEFAULT_RECONNECT_INTERVAL};
pub use store::{ClientStateStore, STICK_SAMPLE_TTL};
