//! Package ids and deployment reports.

use serde::{Deserialize, Serialize};

use crate::Abi;

/// Newtype for an Android package identifier (e.g. `com.example.app`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

/// Errors that can occur when validating a [`PackageId`].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PackageIdError {
    /// The identifier is empty.
    #[error("Empty package identifier")]
    Empty,

    /// The identifier contains a character the package manager never emits.
    #[error("Invalid character {ch:?} in package identifier '{id}'")]
    InvalidChar {
        /// The offending identifier
        id: String,
        /// First rejected character
        ch: char,
    },
}

impl PackageId {
    /// Create a validated `PackageId`.
    ///
    /// Only ASCII alphanumerics, `.` and `_` are accepted; the identifier is
    /// later interpolated into device shell commands.
    ///
    /// # Errors
    ///
    /// Returns [`PackageIdError`] if `s` is empty or contains other characters.
    pub fn new(s: impl Into<String>) -> Result<Self, PackageIdError> {
        let s = s.into();
        if s.is_empty() {
            return Err(PackageIdError::Empty);
        }
        if let Some(ch) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '_'))
        {
            return Err(PackageIdError::InvalidChar { id: s, ch });
        }
        Ok(Self(s))
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which architecture groups a deployment processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "abi")]
pub enum Selection {
    /// Only the group matching the device ABI.
    Single(Abi),
    /// Every group, in archive order (device ABI unknown or not shipped).
    All,
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(abi) => write!(f, "{abi}"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Step at which a single library failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// Extraction into the local staging area.
    Extract,
    /// Transfer to the device.
    Push,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Extract => "extract",
            Self::Push => "push",
        })
    }
}

/// Per-library failure detail, kept so the transfer can be retried by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Where it went wrong
    pub stage: FailureStage,
    /// Human-readable reason (tool output or I/O error)
    pub reason: String,
}

/// Result of deploying one library entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    /// ABI group the entry belongs to
    pub abi: Abi,
    /// Path inside the archive (e.g. `lib/arm64-v8a/libfoo.so`)
    pub entry: String,
    /// Destination on the device
    pub remote_path: String,
    /// `None` on success
    pub failure: Option<FileFailure>,
}

impl FileOutcome {
    /// Whether the file reached the device.
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Whether a push was attempted for this file (extraction succeeded).
    pub fn push_attempted(&self) -> bool {
        !matches!(
            self.failure,
            Some(FileFailure {
                stage: FailureStage::Extract,
                ..
            })
        )
    }
}

/// One architecture group as discovered in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// ABI tag from the `lib/<abi>/` path segment
    pub abi: Abi,
    /// Number of `.so` entries in the group
    pub libraries: usize,
}

/// Aggregate outcome of a deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    /// The archive ships no native libraries; the device was not touched.
    NoLibraries,
    /// The destination was rebuilt. Individual files may still have failed.
    Deployed,
}

/// Summary returned by a native-library deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReport {
    /// Overall status
    pub status: DeployStatus,
    /// Groups discovered in the archive, in archive order
    pub groups: Vec<GroupSummary>,
    /// ABI reported by the device, `None` when the probe failed
    pub device_abi: Option<Abi>,
    /// Groups that were processed (absent for [`DeployStatus::NoLibraries`])
    pub selection: Option<Selection>,
    /// Device-side library directory that was rebuilt
    pub lib_dir: Option<String>,
    /// Per-file results, in processing order
    pub outcomes: Vec<FileOutcome>,
}

impl DeploymentReport {
    /// Report for an archive without native libraries.
    pub fn no_libraries() -> Self {
        Self {
            status: DeployStatus::NoLibraries,
            groups: Vec::new(),
            device_abi: None,
            selection: None,
            lib_dir: None,
            outcomes: Vec::new(),
        }
    }

    /// Files that were processed (extracted or not).
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Files that reached the device.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    /// Files that failed at any stage.
    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Failed outcomes, for the final summary.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

/// A library that a deployment would push, as computed by a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedFile {
    /// ABI group
    pub abi: Abi,
    /// Path inside the archive
    pub entry: String,
    /// Destination on the device
    pub remote_path: String,
}

/// What a deployment would do, without doing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// Groups discovered in the archive
    pub groups: Vec<GroupSummary>,
    /// ABI reported by the device
    pub device_abi: Option<Abi>,
    /// Groups that would be processed; `None` when there is nothing to deploy
    pub selection: Option<Selection>,
    /// Directory that would be wiped and rebuilt
    pub lib_dir: String,
    /// Files that would be pushed, in order
    pub files: Vec<PlannedFile>,
}
