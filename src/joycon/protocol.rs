//! # Joy-Con Protocol Constants and Types
//!
//! Core definitions for the Joy-Con HID input protocol: device ids, report
//! layout offsets, and the per-side button bit tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Nintendo vendor ID
pub const NINTENDO_VENDOR_ID: u16 = 0x057e;

/// Joy-Con (L) product ID
pub const JOYCON_L_PRODUCT_ID: u16 = 0x2006;

/// Joy-Con (R) product ID
pub const JOYCON_R_PRODUCT_ID: u16 = 0x2007;

/// Standard full input report (60Hz, buttons + sticks + IMU)
pub const REPORT_ID_STANDARD_FULL: u8 = 0x30;

/// Simple HID input report (sent before the mode switch)
pub const REPORT_ID_SIMPLE_HID: u8 = 0x3F;

/// Offset of the first of the three button bytes
pub const BUTTON_BYTES_OFFSET: usize = 3;

/// Number of button bytes (right, shared, left)
pub const BUTTON_BYTES_LEN: usize = 3;

/// Offset of the packed left stick axes (3 bytes)
pub const LEFT_STICK_OFFSET: usize = 6;

/// Offset of the packed right stick axes (3 bytes)
pub const RIGHT_STICK_OFFSET: usize = 9;

/// Shortest report that carries buttons and both sticks
pub const INPUT_REPORT_MIN_LEN: usize = 12;

/// HID read buffer size (full reports are 49 bytes)
pub const INPUT_REPORT_BUFFER_SIZE: usize = 64;

/// Raw 12-bit stick range (0-4095)
pub const STICK_VALUE_MAX: u16 = 4095;

/// Stick center used for both axes of both sticks
pub const STICK_CENTER: u16 = 2048;

/// Displacement radius at or below which a stick reads as neutral
pub const STICK_DEADZONE_RADIUS: f64 = 300.0;

/// Output report carrying rumble data and a sub-command
pub const OUTPUT_REPORT_SUBCOMMAND: u8 = 0x01;

/// Rumble data that leaves both motors idle (8 bytes)
pub const RUMBLE_NEUTRAL: [u8; 8] = [0x00, 0x01, 0x40, 0x40, 0x00, 0x01, 0x40, 0x40];

/// Sub-command: set input report mode
pub const SUBCMD_SET_INPUT_REPORT_MODE: u8 = 0x03;

/// Three button bytes as read from an input report
pub type ButtonBytes = [u8; BUTTON_BYTES_LEN];

/// Physical side of a Joy-Con
///
/// Selects the button bit table and the stick that carries data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControllerSide {
    /// Joy-Con (L)
    #[serde(rename = "L")]
    Left,
    /// Joy-Con (R)
    #[serde(rename = "R")]
    Right,
}

impl ControllerSide {
    /// Both sides, left first
    pub const ALL: [ControllerSide; 2] = [ControllerSide::Left, ControllerSide::Right];

    /// Map a USB product ID to a side, if it is a Joy-Con
    pub fn from_product_id(product_id: u16) -> Option<Self> {
        match product_id {
            JOYCON_L_PRODUCT_ID => Some(ControllerSide::Left),
            JOYCON_R_PRODUCT_ID => Some(ControllerSide::Right),
            _ => None,
        }
    }

    /// USB product ID for this side
    pub fn product_id(self) -> u16 {
        match self {
            ControllerSide::Left => JOYCON_L_PRODUCT_ID,
            ControllerSide::Right => JOYCON_R_PRODUCT_ID,
        }
    }

    /// Wire tag ("L" or "R")
    pub fn as_str(self) -> &'static str {
        match self {
            ControllerSide::Left => "L",
            ControllerSide::Right => "R",
        }
    }

    /// The analog stick physically present on this side
    pub fn stick(self) -> Stick {
        match self {
            ControllerSide::Left => Stick::Left,
            ControllerSide::Right => Stick::Right,
        }
    }

    /// Bit table for this side's button bytes
    pub fn button_map(self) -> &'static [ButtonBit] {
        match self {
            ControllerSide::Left => LEFT_BUTTON_MAP,
            ControllerSide::Right => RIGHT_BUTTON_MAP,
        }
    }

    /// Whether `name` exists on this side
    pub fn has_button(self, name: ButtonName) -> bool {
        self.button_map().iter().any(|bit| bit.name == name)
    }
}

impl fmt::Display for ControllerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analog stick identifier used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stick {
    Left,
    Right,
}

impl Stick {
    /// Offset of this stick's packed axes in an input report
    pub fn report_offset(self) -> usize {
        match self {
            Stick::Left => LEFT_STICK_OFFSET,
            Stick::Right => RIGHT_STICK_OFFSET,
        }
    }
}

/// Button names across both Joy-Cons
///
/// `Sr` and `Sl` exist on both sides; every other name belongs to one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ButtonName {
    // Joy-Con (R)
    Y,
    X,
    B,
    A,
    R,
    #[serde(rename = "ZR")]
    Zr,
    Plus,
    #[serde(rename = "RStick")]
    RStick,
    Home,

    // Joy-Con (L)
    Down,
    Up,
    Right,
    Left,
    L,
    #[serde(rename = "ZL")]
    Zl,
    Minus,
    #[serde(rename = "LStick")]
    LStick,
    Capture,

    // Rail buttons (both sides)
    #[serde(rename = "SR")]
    Sr,
    #[serde(rename = "SL")]
    Sl,
}

impl ButtonName {
    /// Every button name
    pub const ALL: [ButtonName; 20] = [
        ButtonName::Y,
        ButtonName::X,
        ButtonName::B,
        ButtonName::A,
        ButtonName::R,
        ButtonName::Zr,
        ButtonName::Plus,
        ButtonName::RStick,
        ButtonName::Home,
        ButtonName::Down,
        ButtonName::Up,
        ButtonName::Right,
        ButtonName::Left,
        ButtonName::L,
        ButtonName::Zl,
        ButtonName::Minus,
        ButtonName::LStick,
        ButtonName::Capture,
        ButtonName::Sr,
        ButtonName::Sl,
    ];

    /// Wire name (e.g. "ZR", "RStick")
    pub fn as_str(self) -> &'static str {
        match self {
            ButtonName::Y => "Y",
            ButtonName::X => "X",
            ButtonName::B => "B",
            ButtonName::A => "A",
            ButtonName::R => "R",
            ButtonName::Zr => "ZR",
            ButtonName::Plus => "Plus",
            ButtonName::RStick => "RStick",
            ButtonName::Home => "Home",
            ButtonName::Down => "Down",
            ButtonName::Up => "Up",
            ButtonName::Right => "Right",
            ButtonName::Left => "Left",
            ButtonName::L => "L",
            ButtonName::Zl => "ZL",
            ButtonName::Minus => "Minus",
            ButtonName::LStick => "LStick",
            ButtonName::Capture => "Capture",
            ButtonName::Sr => "SR",
            ButtonName::Sl => "SL",
        }
    }
}

impl fmt::Display for ButtonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown button name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownButton(pub String);

impl fmt::Display for UnknownButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown button name: {}", self.0)
    }
}

impl std::error::Error for UnknownButton {}

impl FromStr for ButtonName {
    type Err = UnknownButton;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ButtonName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownButton(s.to_string()))
    }
}

/// One physical button: a name on a given side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonKey {
    pub name: ButtonName,
    pub side: ControllerSide,
}

impl ButtonKey {
    pub fn new(name: ButtonName, side: ControllerSide) -> Self {
        Self { name, side }
    }
}

impl fmt::Display for ButtonKey {
    /// Formats as `<name>_<side>`, e.g. `A_R`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.side)
    }
}

/// One entry of a button bit table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonBit {
    /// Index into [`ButtonBytes`] (0 = right byte, 1 = shared, 2 = left byte)
    pub byte: usize,
    /// Bit mask within that byte
    pub mask: u8,
    pub name: ButtonName,
}

const fn bit(byte: usize, mask: u8, name: ButtonName) -> ButtonBit {
    ButtonBit { byte, mask, name }
}

/// Joy-Con (R): report byte 3 and shared byte 4
pub const RIGHT_BUTTON_MAP: &[ButtonBit] = &[
    bit(0, 0x01, ButtonName::Y),
    bit(0, 0x02, ButtonName::X),
    bit(0, 0x04, ButtonName::B),
    bit(0, 0x08, ButtonName::A),
    bit(0, 0x10, ButtonName::Sr),
    bit(0, 0x20, ButtonName::Sl),
    bit(0, 0x40, ButtonName::R),
    bit(0, 0x80, ButtonName::Zr),
    bit(1, 0x02, ButtonName::Plus),
    bit(1, 0x04, ButtonName::RStick),
    bit(1, 0x10, ButtonName::Home),
];

/// Joy-Con (L): report byte 5 and shared byte 4
pub const LEFT_BUTTON_MAP: &[ButtonBit] = &[
    bit(2, 0x01, ButtonName::Down),
    bit(2, 0x02, ButtonName::Up),
    bit(2, 0x04, ButtonName::Right),
    bit(2, 0x08, ButtonName::Left),
    bit(2, 0x10, ButtonName::Sr),
    bit(2, 0x20, ButtonName::Sl),
    bit(2, 0x40, ButtonName::L),
    bit(2, 0x80, ButtonName::Zl),
    bit(1, 0x01, ButtonName::Minus),
    bit(1, 0x08, ButtonName::LStick),
    bit(1, 0x20, ButtonName::Capture),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_device_ids() {
        assert_eq!(NINTENDO_VENDOR_ID, 0x057e);
        assert_eq!(JOYCON_L_PRODUCT_ID, 0x2006);
        assert_eq!(JOYCON_R_PRODUCT_ID, 0x2007);
    }

    #[test]
    fn test_side_from_product_id() {
        assert_eq!(ControllerSide::from_product_id(0x2006), Some(ControllerSide::Left));
        assert_eq!(ControllerSide::from_product_id(0x2007), Some(ControllerSide::Right));
        // Pro Controller is not on the allow-list
        assert_eq!(ControllerSide::from_product_id(0x2009), None);

        for side in ControllerSide::ALL {
            assert_eq!(ControllerSide::from_product_id(side.product_id()), Some(side));
        }
    }

    #[test]
    fn test_side_stick() {
        assert_eq!(ControllerSide::Left.stick(), Stick::Left);
        assert_eq!(ControllerSide::Right.stick(), Stick::Right);
        assert_eq!(Stick::Left.report_offset(), 6);
        assert_eq!(Stick::Right.report_offset(), 9);
    }

    #[test]
    fn test_button_maps_have_eleven_entries() {
        assert_eq!(RIGHT_BUTTON_MAP.len(), 11);
        assert_eq!(LEFT_BUTTON_MAP.len(), 11);
    }

    #[test]
    fn test_button_maps_have_unique_bits() {
        for side in ControllerSide::ALL {
            let bits: HashSet<(usize, u8)> =
                side.button_map().iter().map(|b| (b.byte, b.mask)).collect();
            assert_eq!(bits.len(), side.button_map().len(), "duplicate bit on {}", side);

            let names: HashSet<ButtonName> = side.button_map().iter().map(|b| b.name).collect();
            assert_eq!(names.len(), side.button_map().len(), "duplicate name on {}", side);
        }
    }

    #[test]
    fn test_shared_byte_masks_do_not_overlap() {
        let left: u8 = LEFT_BUTTON_MAP.iter().filter(|b| b.byte == 1).fold(0, |acc, b| acc | b.mask);
        let right: u8 = RIGHT_BUTTON_MAP.iter().filter(|b| b.byte == 1).fold(0, |acc, b| acc | b.mask);
        assert_eq!(left, 0x29);
        assert_eq!(right, 0x16);
        assert_eq!(left & right, 0);
    }

    #[test]
    fn test_vocabularies_only_share_rail_buttons() {
        let left: HashSet<ButtonName> = LEFT_BUTTON_MAP.iter().map(|b| b.name).collect();
        let right: HashSet<ButtonName> = RIGHT_BUTTON_MAP.iter().map(|b| b.name).collect();
        let shared: HashSet<ButtonName> = left.intersection(&right).copied().collect();
        assert_eq!(shared, HashSet::from([ButtonName::Sr, ButtonName::Sl]));
        assert_eq!(left.len() + right.len() - shared.len(), ButtonName::ALL.len());
    }

    #[test]
    fn test_has_button() {
        assert!(ControllerSide::Right.has_button(ButtonName::A));
        assert!(!ControllerSide::Left.has_button(ButtonName::A));
        assert!(ControllerSide::Left.has_button(ButtonName::Capture));
        assert!(ControllerSide::Left.has_button(ButtonName::Sr));
        assert!(ControllerSide::Right.has_button(ButtonName::Sr));
    }

    #[test]
    fn test_button_name_parse() {
        for name in ButtonName::ALL {
            assert_eq!(name.as_str().parse::<ButtonName>(), Ok(name));
        }
        assert_eq!("ZR".parse::<ButtonName>(), Ok(ButtonName::Zr));
        assert!("Zr".parse::<ButtonName>().is_err());
        assert!("Start".parse::<ButtonName>().is_err());
    }

    #[test]
    fn test_button_name_serde_matches_as_str() {
        for name in ButtonName::ALL {
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, format!("\"{}\"", name.as_str()));
        }
    }

    #[test]
    fn test_button_key_display() {
        assert_eq!(ButtonKey::new(ButtonName::A, ControllerSide::Right).to_string(), "A_R");
        assert_eq!(ButtonKey::new(ButtonName::Sl, ControllerSide::Left).to_string(), "SL_L");
    }

    #[test]
    fn test_rumble_neutral_pattern() {
        assert_eq!(RUMBLE_NEUTRAL.len(), 8);
        assert_eq!(RUMBLE_NEUTRAL[..4], RUMBLE_NEUTRAL[4..]);
    }
}
