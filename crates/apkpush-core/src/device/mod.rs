//! Device-side operations: the bridge, architecture probe, package lookup
//! and framework restart.

pub mod bridge;
pub mod package;
pub mod probe;
pub mod remote;

pub use bridge::{AdbBridge, BridgeError, CommandOutput, DeviceBridge};
pub use package::{ResolveError, resolve_install_path};
pub use probe::{ProbeError, probe_abi};

use thiserror::Error;

/// A device as listed by `adb devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Serial number passed to `adb -s`
    pub serial: String,
    /// Connection state (`device`, `offline`, `unauthorized`, ...)
    pub state: String,
}

impl DeviceInfo {
    /// Whether the device is connected and authorized.
    pub fn is_ready(&self) -> bool {
        self.state == "device"
    }
}

/// Parse the output of `adb devices`.
pub fn parse_devices(output: &str) -> Vec<DeviceInfo> {
    output
        .lines()
        .map(str::trim)
        // Skip the header and adb server chatter ("* daemon started ...")
        .filter(|line| {
            !line.is_empty() && !line.starts_with("List of devices") && !line.starts_with('*')
        })
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next()?;
            Some(DeviceInfo {
                serial: serial.to_string(),
                state: state.to_string(),
            })
        })
        .collect()
}

/// Errors from [`soft_restart`].
#[derive(Error, Debug)]
pub enum RestartError {
    /// The step could not be sent to the device.
    #[error("Failed to run '{step}': {source}")]
    Bridge {
        /// Shell command that was being run
        step: &'static str,
        /// Underlying bridge error
        #[source]
        source: BridgeError,
    },

    /// The step ran and reported failure.
    #[error("'{step}' failed: {detail}")]
    Failed {
        /// Shell command that failed
        step: &'static str,
        /// Exit status and output of the command
        detail: String,
    },
}

/// Flush storage and restart the Android framework (`sync`, `stop`, `start`).
///
/// Needed for the system to pick up replaced libraries of a system app.
/// Stops at the first failing step.
///
/// # Errors
///
/// Returns [`RestartError`] naming the step that failed.
pub fn soft_restart<B: DeviceBridge + ?Sized>(bridge: &B) -> Result<(), RestartError> {
    for step in ["sync", "stop", "start"] {
        tracing::info!(step, "Restarting framework");
        let output = bridge
            .shell(&[step])
            .map_err(|source| RestartError::Bridge { step, source })?;
        if !output.success() {
            return Err(RestartError::Failed {
                step,
                detail: output.failure_detail(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;

    struct ScriptedBridge {
        fail_on: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl DeviceBridge for ScriptedBridge {
        fn shell(&self, argv: &[&str]) -> Result<CommandOutput, BridgeError> {
            self.calls.borrow_mut().push(argv.join(" "));
            if self.fail_on == Some(argv[0]) {
                Ok(CommandOutput::failed(1, "Permission denied"))
            } else {
                Ok(CommandOutput::ok(""))
            }
        }

        fn push(&self, _: &Path, _: &str) -> Result<CommandOutput, BridgeError> {
            unreachable!("restart never pushes")
        }
    }

    #[test]
    fn test_parse_devices() {
        let output = "* daemon not running; starting now at tcp:5037\n\
                      * daemon started successfully\n\
                      List of devices attached\n\
                      emulator-5554\tdevice\n\
                      R58M123ABC\tunauthorized\n\
                      0123456789ABCDEF\toffline\n\n";
        let devices = parse_devices(output);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].serial, "emulator-5554");
        assert!(devices[0].is_ready());
        assert!(!devices[1].is_ready());
        assert_eq!(devices[2].state, "offline");
    }

    #[test]
    fn test_parse_devices_none_attached() {
        assert!(parse_devices("List of devices attached\n\n").is_empty());
    }

    #[test]
    fn test_soft_restart_runs_in_order() {
        let bridge = ScriptedBridge {
            fail_on: None,
            calls: RefCell::new(Vec::new()),
        };
        soft_restart(&bridge).unwrap();
        assert_eq!(*bridge.calls.borrow(), vec!["sync", "stop", "start"]);
    }

    #[test]
    fn test_soft_restart_stops_at_first_failure() {
        let bridge = ScriptedBridge {
            fail_on: Some("stop"),
            calls: RefCell::new(Vec::new()),
        };
        let err = soft_restart(&bridge).unwrap_err();
        assert!(matches!(err, RestartError::Failed { step: "stop", .. }));
        assert_eq!(*bridge.calls.borrow(), vec!["sync", "stop"]);
    }
}
