//! # Joy-Con Bridge Library
//!
//! Stream Nintendo Joy-Con input to WebSocket clients.
//!
//! The server side reads HID input reports from connected Joy-Cons, turns
//! button changes into press/release events and stick positions into compass
//! angles, and broadcasts them as JSON. The client side keeps a reconnecting
//! connection and a per-frame queryable view of that stream.

pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod joycon;
pub mod message;
pub mod server;
