//! # Client State Store
//!
//! Turns the transport message stream back into queryable controller state.
//!
//! Button state is double-buffered. Messages write into the current frame
//! as they arrive; [`ClientStateStore::update`] copies current into previous
//! and must be called exactly once per consumer tick. Edge queries compare
//! the two frames, so `is_just_pressed` holds for exactly one tick after a
//! press.
//!
//! Stick angles are momentary: each sample expires [`STICK_SAMPLE_TTL`] after
//! it arrives unless a newer sample for the same stick replaces it.
//!
//! All state sits behind one mutex, so message arrival, expiry, connection
//! changes and `update` never interleave a partial mutation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::connection::{ConnectionEvent, ConnectionState};
use crate::joycon::edge::ButtonAction;
use crate::joycon::protocol::{ButtonKey, ButtonName, ControllerSide, Stick};
use crate::message::TransportMessage;

/// How long a stick sample stays valid without a newer one
pub const STICK_SAMPLE_TTL: Duration = Duration::from_millis(100);

/// Callback for button presses and releases
pub type ButtonListener = Arc<dyn Fn(ButtonName, ControllerSide) + Send + Sync>;

/// Callback for connection state changes
pub type ConnectionListener = Arc<dyn Fn(ConnectionState, &str) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct StickReading {
    angle: u16,
    expires_at: Instant,
}

struct StoreInner {
    current: HashMap<ButtonKey, bool>,
    previous: HashMap<ButtonKey, bool>,
    sticks: HashMap<Stick, StickReading>,
    connection: ConnectionState,
    status: String,
}

impl StoreInner {
    fn current(&self, key: ButtonKey) -> bool {
        self.current.get(&key).copied().unwrap_or(false)
    }

    fn previous(&self, key: ButtonKey) -> bool {
        self.previous.get(&key).copied().unwrap_or(false)
    }
}

#[derive(Default)]
struct Listeners {
    press: Vec<ButtonListener>,
    release: Vec<ButtonListener>,
    connection: Vec<ConnectionListener>,
}

/// Queryable Joy-Con state fed by transport messages
///
/// Cloning is cheap; all clones share the same state.
#[derive(Clone)]
pub struct ClientStateStore {
    inner: Arc<Mutex<StoreInner>>,
    listeners: Arc<Mutex<Listeners>>,
}

impl Default for ClientStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClientStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ClientStateStore")
            .field("connection", &inner.connection)
            .field("status", &inner.status)
            .field("buttons", &inner.current.len())
            .finish_non_exhaustive()
    }
}

/// Level query with the "either side" rule
fn any_side(side: Option<ControllerSide>, test: impl Fn(ControllerSide) -> bool) -> bool {
    match side {
        Some(side) => test(side),
        None => ControllerSide::ALL.into_iter().any(test),
    }
}

impl ClientStateStore {
    /// Create an empty, disconnected store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                current: HashMap::new(),
                previous: HashMap::new(),
                sticks: HashMap::new(),
                connection: ConnectionState::Disconnected,
                status: ConnectionState::Disconnected.to_string(),
            })),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one transport message
    ///
    /// Button listeners run synchronously before this returns.
    pub fn apply(&self, message: TransportMessage) {
        match message {
            TransportMessage::Button { button, action, joycon } => {
                let key = ButtonKey::new(button, joycon);
                self.lock().current.insert(key, action == ButtonAction::Press);

                // Snapshot so listeners may call back into the store
                let listeners = {
                    let listeners = self.lock_listeners();
                    match action {
                        ButtonAction::Press => listeners.press.clone(),
                        ButtonAction::Release => listeners.release.clone(),
                    }
                };
                for listener in listeners {
                    listener(button, joycon);
                }
            }
            TransportMessage::Joystick { stick, angle, .. } => {
                let reading = StickReading {
                    angle,
                    expires_at: Instant::now() + STICK_SAMPLE_TTL,
                };
                self.lock().sticks.insert(stick, reading);
            }
        }
    }

    /// Parse and apply one text frame
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the frame was a valid message
    pub fn apply_text(&self, text: &str) -> bool {
        match TransportMessage::from_json(text) {
            Ok(message) => {
                self.apply(message);
                true
            }
            Err(e) => {
                debug!("Ignoring malformed message {:?}: {}", text, e);
                false
            }
        }
    }

    /// Close the current frame: copy current button state into previous
    ///
    /// Call exactly once per consumer tick.
    pub fn update(&self) {
        let mut inner = self.lock();
        inner.previous = inner.current.clone();
    }

    /// Whether a button is held
    ///
    /// With `side` omitted, true if the name is held on either Joy-Con.
    pub fn is_pressed(&self, name: ButtonName, side: Option<ControllerSide>) -> bool {
        let inner = self.lock();
        any_side(side, |side| inner.current(ButtonKey::new(name, side)))
    }

    /// Whether a button went down during the last frame
    ///
    /// With `side` omitted, true if either side has its own press edge, even
    /// when the other side was already held.
    pub fn is_just_pressed(&self, name: ButtonName, side: Option<ControllerSide>) -> bool {
        let inner = self.lock();
        any_side(side, |side| {
            let key = ButtonKey::new(name, side);
            inner.current(key) && !inner.previous(key)
        })
    }

    /// Whether a button went up during the last frame
    pub fn is_just_released(&self, name: ButtonName, side: Option<ControllerSide>) -> bool {
        let inner = self.lock();
        any_side(side, |side| {
            let key = ButtonKey::new(name, side);
            !inner.current(key) && inner.previous(key)
        })
    }

    /// Current angle of a stick, or `None` when neutral or expired
    pub fn stick_angle(&self, stick: Stick) -> Option<u16> {
        let mut inner = self.lock();
        let reading = *inner.sticks.get(&stick)?;
        if Instant::now() >= reading.expires_at {
            inner.sticks.remove(&stick);
            return None;
        }
        Some(reading.angle)
    }

    pub fn left_stick_angle(&self) -> Option<u16> {
        self.stick_angle(Stick::Left)
    }

    pub fn right_stick_angle(&self) -> Option<u16> {
        self.stick_angle(Stick::Right)
    }

    /// Buttons currently held, sorted
    pub fn pressed_buttons(&self) -> Vec<ButtonKey> {
        let inner = self.lock();
        let mut keys: Vec<ButtonKey> = inner
            .current
            .iter()
            .filter(|(_, pressed)| **pressed)
            .map(|(key, _)| *key)
            .collect();
        keys.sort();
        keys
    }

    /// Every button seen since the store was created, sorted
    pub fn known_buttons(&self) -> Vec<ButtonKey> {
        let mut keys: Vec<ButtonKey> = self.lock().current.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Register a callback run on every press message
    pub fn on_button_press<F>(&self, listener: F)
    where
        F: Fn(ButtonName, ControllerSide) + Send + Sync + 'static,
    {
        self.lock_listeners().press.push(Arc::new(listener));
    }

    /// Register a callback run on every release message
    pub fn on_button_release<F>(&self, listener: F)
    where
        F: Fn(ButtonName, ControllerSide) + Send + Sync + 'static,
    {
        self.lock_listeners().release.push(Arc::new(listener));
    }

    /// Register a callback run on every connection state change
    pub fn on_connection_change<F>(&self, listener: F)
    where
        F: Fn(ConnectionState, &str) + Send + Sync + 'static,
    {
        self.lock_listeners().connection.push(Arc::new(listener));
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.lock().connection
    }

    /// Human-readable connection status
    pub fn status(&self) -> String {
        self.lock().status.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Record a transport event and notify connection listeners
    pub(crate) fn record_connection_event(&self, event: ConnectionEvent) {
        let (state, status) = event.outcome();
        {
            let mut inner = self.lock();
            inner.connection = state;
            inner.status = status.clone();
        }

        let listeners = self.lock_listeners().connection.clone();
        for listener in listeners {
            listener(state, &status);
        }
    }
}
