//! # Joy-Con Protocol Module
//!
//! Implementation of the Joy-Con HID input protocol.
//!
//! This module handles:
//! - Input report validation and decoding (buttons, packed 12-bit sticks)
//! - Stick direction estimation with a deadzone
//! - Button press/release edge detection per controller side
//! - Sub-command frame encoding (input report mode switch)

pub mod protocol;
pub mod decoder;
pub mod stick;
pub mod edge;
pub mod subcommand;
