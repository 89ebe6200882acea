//! # Joy-Con Bridge
//!
//! Stream Nintendo Joy-Con input to WebSocket clients.
//!
//! Opens every connected Joy-Con, switches it to the full input report mode
//! and broadcasts button presses/releases and stick angles as JSON text
//! frames to every connected WebSocket client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use joycon_bridge::config::Config;
use joycon_bridge::device::{open_joycons, DeviceSession};
use joycon_bridge::joycon::protocol::ControllerSide;
use joycon_bridge::server::{BroadcastHub, WebSocketServer};

/// Main entry point for the Joy-Con bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (argument, `config/default.toml` or defaults)
///    - Open every Joy-Con and switch it to the full report mode
///
/// 2. **Main Loop**
///    - One blocking report loop per Joy-Con, each on its own thread
///    - WebSocket accept loop on the configured address
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop the report loops
///    - Clean exit
///
/// # Errors
///
/// Returns error if:
/// - Configuration is invalid
/// - No Joy-Con is found or none can be initialized
/// - The listen address cannot be bound
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO joycon_bridge: Joy-Con Bridge v0.1.0 starting...
/// INFO joycon_bridge::device::discovery: Detected 2 Joy-Con(s)
/// INFO joycon_bridge::server::websocket: WebSocket server listening on 127.0.0.1:8080
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Joy-Con Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1);
    let config = Config::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    let devices = open_joycons().context("No Joy-Con available")?;

    let hub = BroadcastHub::new();
    let running = Arc::new(AtomicBool::new(true));
    let read_timeout_ms = read_timeout(&config);

    let mut handles = Vec::new();
    for (side, port) in devices {
        let mut session = DeviceSession::new(side, port, hub.clone(), read_timeout_ms);
        if let Err(e) = session.initialize() {
            warn!("Failed to initialize Joy-Con {}: {}", side, e);
            continue;
        }

        match session.spawn(Arc::clone(&running)) {
            Ok(handle) => handles.push((side, handle)),
            Err(e) => error!("Failed to start Joy-Con {} thread: {}", side, e),
        }
    }

    if handles.is_empty() {
        bail!("No Joy-Con could be initialized");
    }

    info!("Streaming {} Joy-Con(s)", handles.len());

    let server = WebSocketServer::bind(&config.server.bind_addr(), hub.clone())
        .await
        .context("Failed to start WebSocket server")?;

    info!("Press Ctrl+C to exit");

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("WebSocket server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    running.store(false, Ordering::SeqCst);
    join_sessions(handles);

    info!("Connected clients at shutdown: {}", hub.client_count());
    Ok(())
}

/// Wait for every session thread, logging any that panicked
///
/// # Returns
///
/// * `usize` - Number of sessions that panicked
fn join_sessions(handles: Vec<(ControllerSide, JoinHandle<()>)>) -> usize {
    let mut panicked = 0;
    for (side, handle) in handles {
        if handle.join().is_err() {
            error!("Joy-Con {} session thread panicked", side);
            panicked += 1;
        }
    }
    panicked
}

/// HID read timeout in the form hidapi expects
fn read_timeout(config: &Config) -> i32 {
    i32::try_from(config.joycon.read_timeout_ms).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_timeout_default() {
        let config = Config::default();
        assert_eq!(read_timeout(&config), 100);
    }

    #[test]
    fn test_join_sessions_counts_panics() {
        let clean = std::thread::spawn(|| {});
        let crashed = std::thread::spawn(|| panic!("session crashed"));

        let handles = vec![(ControllerSide::Left, clean), (ControllerSide::Right, crashed)];
        assert_eq!(join_sessions(handles), 1);
    }

    #[test]
    fn test_join_sessions_empty() {
        assert_eq!(join_sessions(Vec::new()), 0);
    }

    #[test]
    fn test_read_timeout_is_bounded_by_validation() {
        let mut config = Config::default();
        config.joycon.read_timeout_ms = 1000;
        assert_eq!(read_timeout(&config), 1000);
    }
}
