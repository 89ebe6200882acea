//! # Joy-Con Sub-command Encoder
//!
//! Builds output report `0x01` frames: report id, rolling packet counter,
//! neutral rumble data, then the sub-command id and its arguments.
//!
//! ```text
//! [0]     0x01 (report id)
//! [1]     packet counter (0-15)
//! [2..10] rumble data (neutral)
//! [10]    sub-command id
//! [11..]  sub-command arguments
//! ```

use super::protocol::*;

/// Input report mode requested at session start (standard full, 60Hz)
pub const INPUT_MODE_STANDARD_FULL: u8 = REPORT_ID_STANDARD_FULL;

/// Length of the fixed header before sub-command arguments
pub const SUBCOMMAND_HEADER_LEN: usize = 11;

/// Encodes sub-command frames for one device
///
/// Each device keeps its own packet counter, which wraps at 16.
#[derive(Debug, Default, Clone)]
pub struct SubcommandEncoder {
    packet_counter: u8,
}

impl SubcommandEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter value the next frame will carry
    pub fn packet_counter(&self) -> u8 {
        self.packet_counter
    }

    /// Encode a sub-command frame and advance the packet counter
    ///
    /// # Arguments
    ///
    /// * `id` - Sub-command id
    /// * `args` - Sub-command arguments
    ///
    /// # Returns
    ///
    /// * `Vec<u8>` - Complete output report (11 + args.len() bytes)
    pub fn encode(&mut self, id: u8, args: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(SUBCOMMAND_HEADER_LEN + args.len());
        frame.push(OUTPUT_REPORT_SUBCOMMAND);
        frame.push(self.packet_counter);
        frame.extend_from_slice(&RUMBLE_NEUTRAL);
        frame.push(id);
        frame.extend_from_slice(args);

        self.packet_counter = (self.packet_counter + 1) & 0x0F;
        frame
    }

    /// Encode the "set input report mode" sub-command
    ///
    /// # Examples
    ///
    /// ```
    /// use joycon_bridge::joycon::subcommand::{SubcommandEncoder, INPUT_MODE_STANDARD_FULL};
    ///
    /// let mut encoder = SubcommandEncoder::new();
    /// let frame = encoder.set_input_report_mode(INPUT_MODE_STANDARD_FULL);
    /// assert_eq!(frame.len(), 12);
    /// assert_eq!(frame[10], 0x03);
    /// assert_eq!(frame[11], 0x30);
    /// ```
    pub fn set_input_report_mode(&mut self, mode: u8) -> Vec<u8> {
        self.encode(SUBCMD_SET_INPUT_REPORT_MODE, &[mode])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_input_report_mode_frame() {
        let mut encoder = SubcommandEncoder::new();
        let frame = encoder.set_input_report_mode(INPUT_MODE_STANDARD_FULL);

        assert_eq!(
            frame,
            vec![0x01, 0x00, 0x00, 0x01, 0x40, 0x40, 0x00, 0x01, 0x40, 0x40, 0x03, 0x30]
        );
    }

    #[test]
    fn test_packet_counter_increments() {
        let mut encoder = SubcommandEncoder::new();
        assert_eq!(encoder.encode(0x03, &[0x30])[1], 0);
        assert_eq!(encoder.encode(0x03, &[0x30])[1], 1);
        assert_eq!(encoder.encode(0x03, &[0x30])[1], 2);
        assert_eq!(encoder.packet_counter(), 3);
    }

    #[test]
    fn test_packet_counter_wraps_at_16() {
        let mut encoder = SubcommandEncoder::new();
        for expected in 0..16u8 {
            assert_eq!(encoder.encode(0x00, &[])[1], expected);
        }
        assert_eq!(encoder.encode(0x00, &[])[1], 0);
    }

    #[test]
    fn test_frame_without_args() {
        let mut encoder = SubcommandEncoder::new();
        let frame = encoder.encode(0x02, &[]);
        assert_eq!(frame.len(), SUBCOMMAND_HEADER_LEN);
        assert_eq!(frame[10], 0x02);
    }

    #[test]
    fn test_encoders_are_independent() {
        let mut left = SubcommandEncoder::new();
        let mut right = SubcommandEncoder::new();
        left.encode(0x00, &[]);
        left.encode(0x00, &[]);
        assert_eq!(right.encode(0x00, &[])[1], 0);
        assert_eq!(left.packet_counter(), 2);
    }
}
