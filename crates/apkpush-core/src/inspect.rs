//! Package metadata from an APK on the host.
//!
//! The package id is read with `aapt dump badging`, whose first line looks
//! like:
//!
//! ```text
//! package: name='com.example.app' versionCode='42' versionName='1.4.2' ...
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use apkpush_schema::{PackageId, PackageIdError};
use thiserror::Error;

/// Errors reading package metadata.
#[derive(Error, Debug)]
pub enum InspectError {
    /// `aapt` is neither configured nor on `PATH`.
    #[error("'aapt' not found. Install the Android SDK build-tools or set its path with --aapt")]
    ToolNotFound,

    /// `aapt` exists but could not be started.
    #[error("Failed to run aapt: {0}")]
    Spawn(#[source] std::io::Error),

    /// `aapt` rejected the file.
    #[error("aapt could not read {}: {detail}", path.display())]
    Failed {
        /// APK that was inspected
        path: PathBuf,
        /// What aapt printed on stderr
        detail: String,
    },

    /// The badging output had no `package: name='...'`.
    #[error("No package name in aapt output for {}", path.display())]
    MissingName {
        /// APK that was inspected
        path: PathBuf,
    },

    /// The declared name is not a valid application id.
    #[error(transparent)]
    InvalidId(#[from] PackageIdError),
}

/// Reads identifying metadata from an APK file.
pub trait PackageInspector {
    /// The application id declared in the APK's manifest.
    fn package_id(&self, apk: &Path) -> Result<PackageId, InspectError>;
}

impl<T: PackageInspector + ?Sized> PackageInspector for &T {
    fn package_id(&self, apk: &Path) -> Result<PackageId, InspectError> {
        (**self).package_id(apk)
    }
}

/// [`PackageInspector`] backed by the `aapt` tool.
#[derive(Debug, Clone)]
pub struct AaptInspector {
    aapt: PathBuf,
}

impl AaptInspector {
    /// Use an explicit `aapt` binary.
    pub fn new(aapt: impl Into<PathBuf>) -> Self {
        Self { aapt: aapt.into() }
    }

    /// Use `aapt` from `explicit`, or from `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::ToolNotFound`] if no path was given and `aapt`
    /// is not on `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, InspectError> {
        let aapt = match explicit {
            Some(path) => path.to_path_buf(),
            None => which::which("aapt").map_err(|_| InspectError::ToolNotFound)?,
        };
        tracing::debug!(aapt = %aapt.display(), "Using aapt");
        Ok(Self::new(aapt))
    }

    /// Path of the `aapt` executable in use.
    pub fn aapt_path(&self) -> &Path {
        &self.aapt
    }

    /// First line of `aapt version`.
    ///
    /// # Errors
    ///
    /// Returns an error if `aapt` cannot be run.
    pub fn version(&self) -> Result<String, InspectError> {
        let output = self.spawn(Command::new(&self.aapt).arg("version"))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or("").trim().to_string())
    }

    fn spawn(&self, cmd: &mut Command) -> Result<std::process::Output, InspectError> {
        cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InspectError::ToolNotFound
            } else {
                InspectError::Spawn(e)
            }
        })
    }
}

impl PackageInspector for AaptInspector {
    fn package_id(&self, apk: &Path) -> Result<PackageId, InspectError> {
        tracing::debug!(apk = %apk.display(), "aapt dump badging");
        let output = self.spawn(Command::new(&self.aapt).args(["dump", "badging"]).arg(apk))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InspectError::Failed {
                path: apk.to_path_buf(),
                detail: stderr.trim().to_string(),
            });
        }

        let name = parse_badging(&stdout).ok_or_else(|| InspectError::MissingName {
            path: apk.to_path_buf(),
        })?;
        Ok(PackageId::new(name)?)
    }
}

/// Extract the package name from `aapt dump badging` output.
pub fn parse_badging(output: &str) -> Option<&str> {
    let line = output
        .lines()
        .find(|line| line.trim_start().starts_with("package:"))?;
    let rest = &line[line.find("name='")? + "name='".len()..];
    let name = &rest[..rest.find('\'')?];
    (!name.is_empty()).then_some(name)
}
