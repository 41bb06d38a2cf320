//! Locate an installed package on the device (`pm path`).

use apkpush_schema::PackageId;
use thiserror::Error;

use super::bridge::{BridgeError, DeviceBridge};

/// Errors from [`resolve_install_path`].
#[derive(Error, Debug)]
pub enum ResolveError {
    /// `pm` could not be run.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// `pm path` exited with an error.
    #[error("pm path {package} failed: {detail}")]
    Failed {
        /// Package that was looked up
        package: String,
        /// Exit status and output
        detail: String,
    },

    /// `pm path` printed nothing.
    #[error("Package is not installed: {0}")]
    NotInstalled(String),

    /// `pm path` printed no `package:` line.
    #[error("Could not parse install path from: {0}")]
    Unparseable(String),
}

/// Resolve the path of the installed APK for `package`.
///
/// `pm path` prints one `package:<path>` line per APK; with split APKs the
/// base APK is preferred.
///
/// # Errors
///
/// Returns [`ResolveError`] if the command fails, prints nothing, or prints
/// something other than `package:` lines.
pub fn resolve_install_path<B: DeviceBridge + ?Sized>(
    bridge: &B,
    package: &PackageId,
) -> Result<String, ResolveError> {
    let output = bridge.shell(&["pm", "path", package.as_str()])?;
    if !output.success() {
        return Err(ResolveError::Failed {
            package: package.to_string(),
            detail: output.failure_detail(),
        });
    }

    let text = output.stdout.trim();
    if text.is_empty() {
        return Err(ResolveError::NotInstalled(package.to_string()));
    }

    let paths: Vec<&str> = text
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .filter(|path| !path.is_empty())
        .collect();

    paths
        .iter()
        .find(|p| p.ends_with("/base.apk"))
        .or_else(|| paths.first())
        .map(|p| (*p).to_string())
        .ok_or_else(|| ResolveError::Unparseable(text.to_string()))
}
