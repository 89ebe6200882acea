//! # Joy-Con Monitor
//!
//! Consumer for a running bridge. Connects to the configured URL, keeps the
//! client state store ticking at the configured rate and logs button edges
//! and stick angle changes.

use anyhow::{Context, Result};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use joycon_bridge::client::{ClientStateStore, JoyconClient};
use joycon_bridge::config::Config;
use joycon_bridge::joycon::protocol::{ButtonName, ControllerSide, Stick};

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

    let config_path = std::env::args().nth(1);
    let config = Config::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    info!(
        "Joy-Con Monitor v{} connecting to {}",
        env!("CARGO_PKG_VERSION"),
        config.client.url
    );

    let store = ClientStateStore::new();
    store.on_connection_change(|state, status| {
        info!("Connection: {} ({})", state, status);
    });
    store.on_button_press(|name, side| debug!("press {} [{}]", name, side));
    store.on_button_release(|name, side| debug!("release {} [{}]", name, side));

    let client = JoyconClient::connect_with_store(
        config.client.url.clone(),
        config.client.reconnect_interval(),
        store,
    );

    let mut tick = interval(config.client.tick_period());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_angles = [None; 2];

    info!("Ticking at {}Hz, press Ctrl+C to exit", config.client.tick_rate_hz);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                report_frame(client.store(), &mut last_angles);
                client.store().update();
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    Ok(())
}

/// Log this tick's edges and any stick angle that changed since the last tick
fn report_frame(store: &ClientStateStore, last_angles: &mut [Option<u16>; 2]) {
    for side in ControllerSide::ALL {
        for name in ButtonName::ALL {
            if store.is_just_pressed(name, Some(side)) {
                info!("{} pressed on Joy-Con {}", name, side);
            }
            if store.is_just_released(name, Some(side)) {
                info!("{} released on Joy-Con {}", name, side);
            }
        }
    }

    for (slot, stick) in [Stick::Left, Stick::Right].into_iter().enumerate() {
        let angle = store.stick_angle(stick);
        if angle != last_angles[slot] {
            match angle {
                Some(degrees) => info!("{:?} stick at {} deg", stick, degrees),
                None => info!("{:?} stick released", stick),
            }
            last_angles[slot] = angle;
        }
    }
}
