//! # Transport Messages
//!
//! The JSON messages carried over the WebSocket, one per text frame:
//!
//! ```text
//! {"type":"button","button":"A","action":"press","joycon":"R"}
//! {"type":"joystick","stick":"left","angle":270,"joycon":"L"}
//! ```
//!
//! Nothing else crosses the process boundary.

use serde::{Deserialize, Serialize};

use crate::error::{JoyconBridgeError, Result};
use crate::joycon::edge::{ButtonAction, ButtonTransition};
use crate::joycon::protocol::{ButtonKey, ButtonName, ControllerSide, Stick};

/// One event on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportMessage {
    /// A button changed state
    Button {
        button: ButtonName,
        action: ButtonAction,
        joycon: ControllerSide,
    },
    /// A stick sample outside the deadzone
    Joystick {
        stick: Stick,
        angle: u16,
        joycon: ControllerSide,
    },
}

impl TransportMessage {
    /// Message for a detected button transition
    pub fn button(transition: &ButtonTransition) -> Self {
        TransportMessage::Button {
            button: transition.key.name,
            action: transition.action,
            joycon: transition.key.side,
        }
    }

    /// Message for a stick sample from the given side's own stick
    pub fn joystick(side: ControllerSide, angle: u16) -> Self {
        TransportMessage::Joystick {
            stick: side.stick(),
            angle,
            joycon: side,
        }
    }

    /// The controller side that produced this message
    pub fn side(&self) -> ControllerSide {
        match self {
            TransportMessage::Button { joycon, .. } | TransportMessage::Joystick { joycon, .. } => {
                *joycon
            }
        }
    }

    /// Button key, for button messages
    pub fn button_key(&self) -> Option<ButtonKey> {
        match self {
            TransportMessage::Button { button, joycon, .. } => Some(ButtonKey::new(*button, *joycon)),
            TransportMessage::Joystick { .. } => None,
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a JSON text frame
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The text is not a known message shape
    /// - The button does not exist on the named side
    /// - The angle is outside 0-359
    pub fn from_json(text: &str) -> Result<Self> {
        let message: TransportMessage = serde_json::from_str(text)?;
        message.validate()?;
        Ok(message)
    }

    fn validate(&self) -> Result<()> {
        match *self {
            TransportMessage::Button { button, joycon, .. } => {
                if !joycon.has_button(button) {
                    return Err(JoyconBridgeError::Transport(format!(
                        "button {} does not exist on Joy-Con {}",
                        button, joycon
                    )));
                }
            }
            TransportMessage::Joystick { angle, .. } => {
                if angle >= 360 {
                    return Err(JoyconBridgeError::Transport(format!(
                        "stick angle {} out of range (0-359)",
                        angle
                    )));
                }
            }
        }
        Ok(())
    }
}
