//! Device architecture probe.

use apkpush_schema::Abi;
use thiserror::Error;

use super::bridge::{BridgeError, DeviceBridge};

/// System property holding the device's primary ABI.
pub const ABI_PROPERTY: &str = "ro.product.cpu.abi";

/// Why the device ABI could not be determined. Never fatal: callers fall
/// back to deploying every architecture.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The command could not be issued.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// `getprop` exited with an error.
    #[error("getprop ro.product.cpu.abi failed: {0}")]
    Failed(String),

    /// The property is unset.
    #[error("getprop ro.product.cpu.abi returned nothing")]
    Empty,
}

/// Query the device ABI.
///
/// # Errors
///
/// Returns [`ProbeError`] if the command cannot be issued, fails, or prints
/// nothing.
pub fn query_abi<B: DeviceBridge + ?Sized>(bridge: &B) -> Result<Abi, ProbeError> {
    let output = bridge.shell(&["getprop", ABI_PROPERTY])?;
    if !output.success() {
        return Err(ProbeError::Failed(output.failure_detail()));
    }

    let line = output.stdout.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Err(ProbeError::Empty);
    }
    Ok(Abi::parse(line))
}

/// Query the device ABI, downgrading any failure to `None` ("unknown").
pub fn probe_abi<B: DeviceBridge + ?Sized>(bridge: &B) -> Option<Abi> {
    match query_abi(bridge) {
        Ok(abi) => {
            tracing::info!(abi = %abi, "Device architecture");
            Some(abi)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine device architecture, deploying all");
            None
        }
    }
}
