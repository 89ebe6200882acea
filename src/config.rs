//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{JoyconBridgeError, Result};

/// Config file read when no path is given and the file exists
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub joycon: JoyconConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// WebSocket server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Joy-Con device configuration
#[derive(Debug, Deserialize, Clone)]
pub struct JoyconConfig {
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Consumer (monitor) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,
}

// Default value functions
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }

fn default_read_timeout_ms() -> u64 { 100 }

fn default_url() -> String { "ws://localhost:8080".to_string() }
fn default_reconnect_interval_ms() -> u64 { 5000 }
fn default_tick_rate_hz() -> u32 { 60 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for JoyconConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            tick_rate_hz: default_tick_rate_hz(),
        }
    }
}

impl ServerConfig {
    /// Listen address as "host:port"
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ClientConfig {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Period between `update` ticks
    ///
    /// A zero rate (only possible on an unvalidated config) falls back to
    /// the default rate.
    pub fn tick_period(&self) -> Duration {
        let micros = 1_000_000u64
            .checked_div(self.tick_rate_hz as u64)
            .unwrap_or(1_000_000 / default_tick_rate_hz() as u64);
        Duration::from_micros(micros)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joycon_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from [`DEFAULT_CONFIG_PATH`] if it
    /// exists, else use built-in defaults
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(invalid("server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(invalid("server port must be between 1 and 65535"));
        }

        if self.joycon.read_timeout_ms == 0 || self.joycon.read_timeout_ms > 1000 {
            return Err(invalid("read_timeout_ms must be between 1 and 1000"));
        }

        if !(self.client.url.starts_with("ws://") || self.client.url.starts_with("wss://")) {
            return Err(invalid("client url must start with ws:// or wss://"));
        }

        if self.client.reconnect_interval_ms == 0 || self.client.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if ![30, 60, 120].contains(&self.client.tick_rate_hz) {
            return Err(invalid("tick_rate_hz must be one of: 30, 60, 120"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> JoyconBridgeError {
    JoyconBridgeError::Config(toml::de::Error::custom(msg))
}
