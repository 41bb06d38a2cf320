//! Device connection checks.

use anyhow::{Result, bail};
use apkpush_core::AdbBridge;
use apkpush_core::device::DeviceInfo;

/// Pick the device commands will run against.
///
/// With a serial, that device must be listed and ready. Without one, at
/// least one ready device is required.
pub fn select_device<'a>(devices: &'a [DeviceInfo], serial: Option<&str>) -> Result<&'a DeviceInfo> {
    if let Some(serial) = serial {
        return match devices.iter().find(|d| d.serial == serial) {
            Some(device) if device.is_ready() => Ok(device),
            Some(device) => bail!("Device {serial} is {}", device.state),
            None => bail!("Device {serial} is not connected"),
        };
    }

    let mut ready = devices.iter().filter(|d| d.is_ready());
    let Some(first) = ready.next() else {
        match devices.first() {
            Some(device) => bail!("No usable device: {} is {}", device.serial, device.state),
            None => bail!("No device connected. Check the USB cable and that USB debugging is enabled"),
        }
    };
    if ready.next().is_some() {
        tracing::warn!("Several devices are connected; pass --serial to choose one");
    }
    Ok(first)
}

/// Make sure the bridge has a ready device to talk to.
pub fn ensure_device(bridge: &AdbBridge) -> Result<DeviceInfo> {
    let devices = bridge.devices()?;
    let device = select_device(&devices, bridge.serial())?;
    tracing::info!(serial = %device.serial, "Using device");
    Ok(device.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(serial: &str, state: &str) -> DeviceInfo {
        DeviceInfo {
            serial: serial.to_string(),
            state: state.to_string(),
        }
    }

    #[test]
    fn test_first_ready_device() {
        let devices = [device("A", "offline"), device("B", "device")];
        assert_eq!(select_device(&devices, None).unwrap().serial, "B");
    }

    #[test]
    fn test_no_devices() {
        let err = select_device(&[], None).unwrap_err();
        assert!(err.to_string().contains("No device connected"));
    }

    #[test]
    fn test_unauthorized_only() {
        let devices = [device("A", "unauthorized")];
        let err = select_device(&devices, None).unwrap_err();
        assert!(err.to_string().contains("unauthorized"));
    }

    #[test]
    fn test_serial_must_be_ready() {
        let devices = [device("A", "device"), device("B", "offline")];
        assert_eq!(select_device(&devices, Some("A")).unwrap().serial, "A");
        assert!(select_device(&devices, Some("B")).is_err());
        assert!(select_device(&devices, Some("C")).is_err());
    }
}
