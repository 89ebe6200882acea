//! Trait abstraction for HID report I/O to enable testing

use hidapi::HidDevice;

use crate::error::Result;

/// Trait for reading input reports from and writing output reports to a device
#[cfg_attr(test, mockall::automock)]
pub trait ReportPort: Send {
    /// Write one output report, report id first
    fn write_report(&mut self, data: &[u8]) -> Result<usize>;

    /// Read one input report, waiting at most `timeout_ms`
    ///
    /// Returns `Ok(0)` when the timeout elapses with no data.
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize>;
}

/// Wrapper around `hidapi::HidDevice` that implements ReportPort
pub struct HidReportPort {
    device: HidDevice,
}

impl HidReportPort {
    pub fn new(device: HidDevice) -> Self {
        Self { device }
    }
}

impl std::fmt::Debug for HidReportPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidReportPort").finish_non_exhaustive()
    }
}

impl ReportPort for HidReportPort {
    fn write_report(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.device.write(data)?)
    }

    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        Ok(self.device.read_timeout(buf, timeout_ms)?)
    }
}
