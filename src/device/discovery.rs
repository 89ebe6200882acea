//! # Joy-Con Discovery
//!
//! Finds paired Joy-Cons by vendor/product id and opens them.
//!
//! Only the fixed allow-list is considered:
//! - Vendor ID: 0x057e (Nintendo)
//! - Product ID: 0x2006 (Joy-Con L), 0x2007 (Joy-Con R)

use std::collections::HashSet;
use std::ffi::CString;

use hidapi::HidApi;
use tracing::{debug, info, warn};

use super::port::HidReportPort;
use crate::error::{JoyconBridgeError, Result};
use crate::joycon::protocol::{ControllerSide, NINTENDO_VENDOR_ID};

/// A Joy-Con found during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoyconInfo {
    pub side: ControllerSide,
    /// Platform HID path used to open the device
    pub path: CString,
    pub serial_number: Option<String>,
}

/// Side of a device if it is on the allow-list
pub fn match_joycon(vendor_id: u16, product_id: u16) -> Option<ControllerSide> {
    if vendor_id != NINTENDO_VENDOR_ID {
        return None;
    }
    ControllerSide::from_product_id(product_id)
}

/// List every Joy-Con visible to the HID layer
///
/// Devices exposing several interfaces under the same path are listed once.
/// Results are ordered left first, then by path, so startup order is stable.
pub fn find_joycons(api: &HidApi) -> Vec<JoyconInfo> {
    let mut seen = HashSet::new();
    let mut found: Vec<JoyconInfo> = api
        .device_list()
        .filter_map(|dev| {
            let side = match_joycon(dev.vendor_id(), dev.product_id())?;
            debug!(
                "Found HID device {:?} (vendor: 0x{:04x}, product: 0x{:04x})",
                dev.path(),
                dev.vendor_id(),
                dev.product_id()
            );
            Some(JoyconInfo {
                side,
                path: dev.path().to_owned(),
                serial_number: dev.serial_number().map(str::to_string),
            })
        })
        .filter(|info| seen.insert(info.path.clone()))
        .collect();

    found.sort_by(|a, b| a.side.cmp(&b.side).then_with(|| a.path.cmp(&b.path)));
    found
}

/// Open every Joy-Con on the allow-list
///
/// # Returns
///
/// * `Result<Vec<(ControllerSide, HidReportPort)>>` - Opened devices
///
/// # Errors
///
/// - `DeviceNotFound`: nothing matched, or every match failed to open
/// - `Hid`: the HID layer could not be initialized
pub fn open_joycons() -> Result<Vec<(ControllerSide, HidReportPort)>> {
    let api = HidApi::new()?;
    let found = find_joycons(&api);

    if found.is_empty() {
        return Err(JoyconBridgeError::DeviceNotFound);
    }

    info!("Detected {} Joy-Con(s)", found.len());

    let mut opened = Vec::with_capacity(found.len());
    for info in found {
        match api.open_path(&info.path) {
            Ok(device) => {
                info!(
                    "Opened Joy-Con {} (serial: {})",
                    info.side,
                    info.serial_number.as_deref().unwrap_or("unknown")
                );
                opened.push((info.side, HidReportPort::new(device)));
            }
            Err(e) => {
                warn!("Could not open Joy-Con {} at {:?}: {}", info.side, info.path, e);
            }
        }
    }

    if opened.is_empty() {
        return Err(JoyconBridgeError::DeviceNotFound);
    }

    Ok(opened)
}
