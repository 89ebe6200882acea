//! # Device Module
//!
//! Joy-Con HID device handling.
//!
//! This module handles:
//! - Discovering Joy-Cons by vendor/product id
//! - Opening devices and switching them to the full report mode
//! - Running one report loop per device and forwarding events to the hub

pub mod discovery;
pub mod port;
pub mod session;

pub use discovery::{find_joycons, match_joycon, open_joycons, JoyconInfo};
pub use port::{HidReportPort, ReportPort};
pub use session::DeviceSession;
