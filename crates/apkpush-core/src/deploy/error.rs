//! Fatal deployment errors.
//!
//! Per-file problems never show up here; they are recorded in the
//! [`DeploymentReport`](apkpush_schema::DeploymentReport) instead.

use std::path::PathBuf;

use thiserror::Error;
use zip::result::ZipError;

/// Errors that abort a deployment.
#[derive(Error, Debug)]
pub enum DeployError {
    /// The target directory is empty or the device root, so `<target>/lib`
    /// would not name an app directory.
    #[error("Invalid target directory {target:?}: expected the app's install directory")]
    InvalidTarget {
        /// Target directory as given
        target: String,
    },

    /// The archive is missing, unreadable or not a ZIP container.
    #[error("Failed to open archive {}: {source}", path.display())]
    ArchiveOpen {
        /// Archive path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ZipError,
    },

    /// `rm -rf <target>/lib` could not be issued or failed.
    #[error("Failed to clear {dir} on the device: {detail}")]
    DirectoryReset {
        /// Device directory that was being removed
        dir: String,
        /// Exit status and output, or the bridge error
        detail: String,
    },

    /// The local staging directory could not be created.
    #[error("Failed to create staging area: {0}")]
    Staging(#[source] std::io::Error),
}
