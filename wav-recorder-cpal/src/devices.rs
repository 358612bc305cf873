//! Input device enumeration through the default cpal host.

use cpal::traits::{DeviceTrait, HostTrait};

use wav_recorder_core::RecorderError;

/// An input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    pub name: String,
    pub is_default: bool,
}

/// List input devices on the default host, default device first.
pub fn list_input_devices() -> Result<Vec<InputDevice>, RecorderError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(|e| RecorderError::SourceFault(format!("failed to enumerate input devices: {}", e)))?;

    let mut found: Vec<InputDevice> = devices
        .filter_map(|device| device.name().ok())
        .map(|name| InputDevice {
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
        })
        .collect();
    found.sort_by_key(|d| !d.is_default);
    Ok(found)
}

/// Find an input device by exact name, or the host default when `name` is None.
pub(crate) fn find_input_device(name: Option<&str>) -> Result<cpal::Device, RecorderError> {
    let host = cpal::default_host();
    match name {
        None => host.default_input_device().ok_or(RecorderError::DeviceNotAvailable),
        Some(name) => host
            .input_devices()
            .map_err(|e| RecorderError::SourceFault(format!("failed to enumerate input devices: {}", e)))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or(RecorderError::DeviceNotAvailable),
    }
}
