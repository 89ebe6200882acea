//! # Error Types
//!
//! Custom error types for Joy-Con Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Joy-Con Bridge
#[derive(Debug, Error)]
pub enum JoyconBridgeError {
    /// HID layer errors (enumeration, open, read, write)
    #[error("HID error: {0}")]
    Hid(String),

    /// No Joy-Con matched the vendor/product allow-list
    #[error("No Joy-Con found (check Bluetooth pairing)")]
    DeviceNotFound,

    /// WebSocket transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Wire message (de)serialization errors
    #[error("Message encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hidapi::HidError> for JoyconBridgeError {
    fn from(err: hidapi::HidError) -> Self {
        JoyconBridgeError::Hid(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for JoyconBridgeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        JoyconBridgeError::Transport(err.to_string())
    }
}

/// Result type alias for Joy-Con Bridge
pub type Result<T> = std::result::Result<T, JoyconBridgeError>;
