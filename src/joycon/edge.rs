//! # Button Edge Detector
//!
//! Compares two consecutive button-byte snapshots of one Joy-Con and yields
//! only the transitions. Bits that did not change, and bits outside the
//! side's button table, produce nothing.

use serde::{Deserialize, Serialize};

use super::protocol::{ButtonBytes, ButtonKey, ControllerSide};

/// Direction of a button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonAction {
    Press,
    Release,
}

/// One button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonTransition {
    pub key: ButtonKey,
    pub action: ButtonAction,
}

/// Detect press/release transitions between two snapshots
///
/// Transitions are returned in button-table order.
///
/// # Examples
///
/// ```
/// use joycon_bridge::joycon::edge::{detect_transitions, ButtonAction};
/// use joycon_bridge::joycon::protocol::{ButtonName, ControllerSide};
///
/// let events = detect_transitions(ControllerSide::Right, [0x00, 0, 0], [0x08, 0, 0]);
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].key.name, ButtonName::A);
/// assert_eq!(events[0].action, ButtonAction::Press);
/// ```
pub fn detect_transitions(
    side: ControllerSide,
    previous: ButtonBytes,
    current: ButtonBytes,
) -> Vec<ButtonTransition> {
    if previous == current {
        return Vec::new();
    }

    side.button_map()
        .iter()
        .filter_map(|bit| {
            let was = previous[bit.byte] & bit.mask != 0;
            let now = current[bit.byte] & bit.mask != 0;
            let action = match (was, now) {
                (false, true) => ButtonAction::Press,
                (true, false) => ButtonAction::Release,
                _ => return None,
            };
            Some(ButtonTransition {
                key: ButtonKey::new(bit.name, side),
                action,
            })
        })
        .collect()
}
