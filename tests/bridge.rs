//! End-to-end tests: device session -> hub -> WebSocket -> client store

use std::sync::{Arc, Mutex};
use std::time::Duration;

use joycon_bridge::client::{ClientStateStore, ConnectionState, JoyconClient};
use joycon_bridge::device::{DeviceSession, ReportPort};
use joycon_bridge::error::Result;
use joycon_bridge::joycon::protocol::{ButtonName, ControllerSide, Stick};
use joycon_bridge::message::TransportMessage;
use joycon_bridge::server::{BroadcastHub, WebSocketServer};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{timeout, Instant};

/// Device stand-in that accepts writes and never produces reports
#[derive(Default)]
struct IdlePort {
    written: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ReportPort for IdlePort {
    fn write_report(&mut self, data: &[u8]) -> Result<usize> {
        self.written.lock().unwrap().push(data.to_vec());
        Ok(data.len())
    }

    fn read_report(&mut self, _buf: &mut [u8], _timeout_ms: i32) -> Result<usize> {
        Ok(0)
    }
}

/// Full-mode report from Joy-Con (R) with the given right-side button byte
/// and right stick bytes
fn right_report(button_byte: u8, right_stick: [u8; 3]) -> Vec<u8> {
    let mut report = vec![0x30, 0x00, 0x8E, button_byte, 0x00, 0x00, 0x00, 0x08, 0x80];
    report.extend_from_slice(&right_stick);
    report
}

const STICK_CENTERED: [u8; 3] = [0x00, 0x08, 0x80];
/// x = 3048, y = 2048: pointing along +x
const STICK_EAST: [u8; 3] = [0xE8, 0x0B, 0x80];

/// Poll `condition` until it holds or two seconds pass
async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap()
}

async fn start_server() -> (BroadcastHub, String) {
    let hub = BroadcastHub::new();
    let server = WebSocketServer::bind("127.0.0.1:0", hub.clone()).await.unwrap();
    let url = format!("ws://{}", server.local_addr().unwrap());
    tokio::spawn(server.run());
    (hub, url)
}

#[tokio::test]
async fn test_button_press_reaches_client() {
    let (hub, url) = start_server().await;
    let client = JoyconClient::connect(url);
    let store = client.store().clone();

    assert!(wait_for(|| store.is_connected()).await);
    assert!(wait_for(|| hub.client_count() == 1).await);

    let mut session = DeviceSession::new(ControllerSide::Right, IdlePort::default(), hub.clone(), 10);
    // A down, stick centered: one press message and no stick message
    assert_eq!(session.handle_report(&right_report(0x08, STICK_CENTERED)), 1);

    assert!(wait_for(|| store.is_pressed(ButtonName::A, Some(ControllerSide::Right))).await);
    assert!(store.is_pressed(ButtonName::A, None));
    assert!(!store.is_pressed(ButtonName::A, Some(ControllerSide::Left)));
    assert!(store.is_just_pressed(ButtonName::A, None));

    store.update();
    assert!(store.is_pressed(ButtonName::A, None));
    assert!(!store.is_just_pressed(ButtonName::A, None));

    // Held: no new message
    assert_eq!(session.handle_report(&right_report(0x08, STICK_CENTERED)), 0);

    // Released
    assert_eq!(session.handle_report(&right_report(0x00, STICK_CENTERED)), 1);
    assert!(wait_for(|| !store.is_pressed(ButtonName::A, None)).await);
    assert!(store.is_just_released(ButtonName::A, Some(ControllerSide::Right)));
}

#[tokio::test]
async fn test_stick_angle_reaches_client_and_expires() {
    let (hub, url) = start_server().await;
    let client = JoyconClient::connect(url);
    let store = client.store().clone();

    assert!(wait_for(|| hub.client_count() == 1).await);

    let mut session = DeviceSession::new(ControllerSide::Right, IdlePort::default(), hub.clone(), 10);
    assert_eq!(session.handle_report(&right_report(0x00, STICK_EAST)), 1);

    assert!(wait_for(|| store.right_stick_angle() == Some(0)).await);
    assert_eq!(store.stick_angle(Stick::Left), None);

    // No further samples: the reading lapses
    assert!(wait_for(|| store.right_stick_angle().is_none()).await);
}

#[tokio::test]
async fn test_every_client_receives_broadcast() {
    let (hub, url) = start_server().await;
    let first = JoyconClient::connect(url.clone());
    let second = JoyconClient::connect(url);

    assert!(wait_for(|| hub.client_count() == 2).await);

    let press = TransportMessage::Button {
        button: ButtonName::Zl,
        action: joycon_bridge::joycon::edge::ButtonAction::Press,
        joycon: ControllerSide::Left,
    };
    assert_eq!(hub.broadcast(&press), 2);

    for client in [&first, &second] {
        let store = client.store().clone();
        assert!(wait_for(|| store.is_pressed(ButtonName::Zl, Some(ControllerSide::Left))).await);
    }
}

#[tokio::test]
async fn test_disconnected_client_is_removed() {
    let (hub, url) = start_server().await;
    let client = JoyconClient::connect(url);

    assert!(wait_for(|| hub.client_count() == 1).await);
    drop(client);
    assert!(wait_for(|| hub.client_count() == 0).await);
}

#[tokio::test]
async fn test_mode_switch_written_on_initialize() {
    let port = IdlePort::default();
    let written = Arc::clone(&port.written);
    let mut session = DeviceSession::new(ControllerSide::Left, port, BroadcastHub::new(), 10);

    session.initialize().unwrap();

    let written = written.lock().unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0][0], 0x01);
    assert_eq!(&written[0][10..12], &[0x03, 0x30]);
}

#[tokio::test]
async fn test_client_reconnects_after_server_close() {
    // Accept the handshake, then close straight away
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { break };
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                drop(ws);
            }
        }
    });

    let interval = Duration::from_millis(300);
    let store = ClientStateStore::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    store.on_connection_change(move |state, _| {
        let _ = tx.send((state, Instant::now()));
    });

    let _client = JoyconClient::connect_with_store(url, interval, store);

    assert_eq!(next(&mut rx).await.0, ConnectionState::Connecting);
    assert_eq!(next(&mut rx).await.0, ConnectionState::Connected);

    // An unclean drop may surface as an error before the close
    let (mut state, mut closed_at) = next(&mut rx).await;
    if state == ConnectionState::Error {
        (state, closed_at) = next(&mut rx).await;
    }
    assert_eq!(state, ConnectionState::Disconnected);

    let (state, retried_at) = next(&mut rx).await;
    assert_eq!(state, ConnectionState::Connecting);
    assert!(retried_at - closed_at >= interval);

    assert_eq!(next(&mut rx).await.0, ConnectionState::Connected);
}

#[tokio::test]
async fn test_manual_reconnect_while_connected() {
    let (hub, url) = start_server().await;

    let store = ClientStateStore::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    store.on_connection_change(move |state, _| {
        let _ = tx.send(state);
    });
    let client = JoyconClient::connect_with_store(url, Duration::from_secs(5), store);
    let store = client.store().clone();

    assert_eq!(next(&mut rx).await, ConnectionState::Connecting);
    assert_eq!(next(&mut rx).await, ConnectionState::Connected);
    assert!(wait_for(|| hub.client_count() == 1).await);

    client.reconnect();
    assert_eq!(store.connection_state(), ConnectionState::Connecting);
    assert_eq!(store.status(), "Reconnecting...");

    // Straight back to Connected, no close in between
    let mut seen = Vec::new();
    loop {
        let state = next(&mut rx).await;
        seen.push(state);
        if state == ConnectionState::Connected {
            break;
        }
    }
    assert!(seen.iter().all(|state| matches!(
        state,
        ConnectionState::Connecting | ConnectionState::Connected
    )), "unexpected transitions: {:?}", seen);
    assert_eq!(seen.first(), Some(&ConnectionState::Connecting));

    // Old socket pruned, new one registered
    assert!(wait_for(|| hub.client_count() == 1).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(hub.client_count(), 1);

    let press = TransportMessage::Button {
        button: ButtonName::Home,
        action: joycon_bridge::joycon::edge::ButtonAction::Press,
        joycon: ControllerSide::Right,
    };
    assert_eq!(hub.broadcast(&press), 1);
    assert!(wait_for(|| store.is_pressed(ButtonName::Home, Some(ControllerSide::Right))).await);
}
