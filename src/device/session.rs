//! # Joy-Con Device Session
//!
//! Drives one opened Joy-Con: switches it to the 60Hz full report mode, then
//! turns each inbound report into transport messages for the hub.
//!
//! Per report:
//! 1. Decode (unrecognized reports are dropped silently)
//! 2. Detect button transitions against the previous report
//! 3. Estimate the direction of this side's stick
//! 4. Broadcast button messages, then the stick message
//! 5. Keep the button bytes as "previous"
//!
//! A device error ends the session. There is no device-level retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use super::port::ReportPort;
use crate::error::Result;
use crate::joycon::decoder::decode_report;
use crate::joycon::edge::detect_transitions;
use crate::joycon::protocol::{ButtonBytes, ControllerSide, INPUT_REPORT_BUFFER_SIZE};
use crate::joycon::stick::estimate_angle;
use crate::joycon::subcommand::{SubcommandEncoder, INPUT_MODE_STANDARD_FULL};
use crate::message::TransportMessage;
use crate::server::hub::BroadcastHub;

/// One Joy-Con's input pipeline
pub struct DeviceSession<P: ReportPort> {
    side: ControllerSide,
    port: P,
    encoder: SubcommandEncoder,
    previous_buttons: ButtonBytes,
    hub: BroadcastHub,
    read_timeout_ms: i32,
}

impl<P: ReportPort> std::fmt::Debug for DeviceSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("side", &self.side)
            .field("previous_buttons", &self.previous_buttons)
            .finish_non_exhaustive()
    }
}

impl<P: ReportPort> DeviceSession<P> {
    /// Create a session for an opened device
    ///
    /// # Arguments
    ///
    /// * `side` - Which Joy-Con this is (fixed for the session's lifetime)
    /// * `port` - Opened device
    /// * `hub` - Destination for transport messages
    /// * `read_timeout_ms` - How long a single read may wait for a report
    pub fn new(side: ControllerSide, port: P, hub: BroadcastHub, read_timeout_ms: i32) -> Self {
        Self {
            side,
            port,
            encoder: SubcommandEncoder::new(),
            previous_buttons: [0; 3],
            hub,
            read_timeout_ms,
        }
    }

    pub fn side(&self) -> ControllerSide {
        self.side
    }

    /// Request the standard full input report stream (60Hz)
    ///
    /// # Errors
    ///
    /// Returns `Hid` if the sub-command cannot be written
    pub fn initialize(&mut self) -> Result<()> {
        let frame = self.encoder.set_input_report_mode(INPUT_MODE_STANDARD_FULL);
        self.port.write_report(&frame)?;
        info!("Joy-Con {} switched to full report mode", self.side);
        Ok(())
    }

    /// Turn one raw report into transport messages
    ///
    /// Returns an empty list for unrecognized reports, which also leave the
    /// stored button state untouched.
    pub fn process_report(&mut self, report: &[u8]) -> Vec<TransportMessage> {
        let Some(decoded) = decode_report(report) else {
            return Vec::new();
        };

        let mut messages: Vec<TransportMessage> =
            detect_transitions(self.side, self.previous_buttons, decoded.buttons)
                .iter()
                .map(TransportMessage::button)
                .collect();

        let raw = decoded.stick(self.side.stick());
        if let Some(angle) = estimate_angle(raw).degrees() {
            messages.push(TransportMessage::joystick(self.side, angle));
        }

        self.previous_buttons = decoded.buttons;
        messages
    }

    /// Process one raw report and broadcast the result
    ///
    /// # Returns
    ///
    /// * `usize` - Number of messages produced
    pub fn handle_report(&mut self, report: &[u8]) -> usize {
        let messages = self.process_report(report);
        for message in &messages {
            self.hub.broadcast(message);
        }
        messages.len()
    }

    /// Read and handle reports until `running` is cleared or the device fails
    ///
    /// # Errors
    ///
    /// Returns the device error that ended the session
    pub fn run(mut self, running: Arc<AtomicBool>) -> Result<()> {
        let mut buf = [0u8; INPUT_REPORT_BUFFER_SIZE];

        while running.load(Ordering::SeqCst) {
            let len = self.port.read_report(&mut buf, self.read_timeout_ms)?;
            if len == 0 {
                continue;
            }
            self.handle_report(&buf[..len]);
        }

        debug!("Joy-Con {} session stopped", self.side);
        Ok(())
    }
}

impl<P: ReportPort + 'static> DeviceSession<P> {
    /// Run the session on its own thread (HID reads block)
    ///
    /// A device error is logged and ends the thread.
    pub fn spawn(self, running: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
        let side = self.side;
        thread::Builder::new()
            .name(format!("joycon-{}", side))
            .spawn(move || {
                if let Err(e) = self.run(running) {
                    error!("HID error [{}]: {}; session ended", side, e);
                }
            })
    }
}
