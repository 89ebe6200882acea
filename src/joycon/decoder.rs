//! # Joy-Con Input Report Decoder
//!
//! Decodes raw HID input reports into button bytes and stick samples.
//!
//! Only the full-state report types (`0x30` and `0x3F`) are decoded. Every
//! other report id is expected noise from the controller (sub-command
//! replies, MCU data) and yields `None`.

use super::protocol::*;
use super::stick::RawStick;

/// Decoded contents of one input report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputReport {
    /// Report id (0x30 or 0x3F)
    pub report_id: u8,
    /// Button bytes at offsets 3, 4, 5
    pub buttons: ButtonBytes,
    pub left_stick: RawStick,
    pub right_stick: RawStick,
}

impl InputReport {
    /// Raw sample for the given stick
    pub fn stick(&self, stick: Stick) -> RawStick {
        match stick {
            Stick::Left => self.left_stick,
            Stick::Right => self.right_stick,
        }
    }
}

/// Whether a report id is one of the accepted full-state reports
pub fn is_full_state_report(report_id: u8) -> bool {
    report_id == REPORT_ID_STANDARD_FULL || report_id == REPORT_ID_SIMPLE_HID
}

/// Decode a raw input report
///
/// # Arguments
///
/// * `report` - Report bytes as read from the device, report id first
///
/// # Returns
///
/// * `Option<InputReport>` - Decoded report, or `None` if the report type is
///   not recognized or the report is too short
///
/// # Examples
///
/// ```
/// use joycon_bridge::joycon::decoder::decode_report;
///
/// let mut report = [0u8; 49];
/// report[0] = 0x30;
/// report[3] = 0x08; // A on Joy-Con (R)
/// let decoded = decode_report(&report).unwrap();
/// assert_eq!(decoded.buttons, [0x08, 0x00, 0x00]);
///
/// report[0] = 0x21; // sub-command reply
/// assert!(decode_report(&report).is_none());
/// ```
pub fn decode_report(report: &[u8]) -> Option<InputReport> {
    if report.len() < INPUT_REPORT_MIN_LEN || !is_full_state_report(report[0]) {
        return None;
    }

    let mut buttons = [0u8; BUTTON_BYTES_LEN];
    buttons.copy_from_slice(&report[BUTTON_BYTES_OFFSET..BUTTON_BYTES_OFFSET + BUTTON_BYTES_LEN]);

    Some(InputReport {
        report_id: report[0],
        buttons,
        left_stick: unpack_stick(report, LEFT_STICK_OFFSET),
        right_stick: unpack_stick(report, RIGHT_STICK_OFFSET),
    })
}

fn unpack_stick(report: &[u8], offset: usize) -> RawStick {
    RawStick::unpack([report[offset], report[offset + 1], report[offset + 2]])
}
