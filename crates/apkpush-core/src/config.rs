//! User configuration (`~/.apkpush/config.toml`).
//!
//! Every key is optional. Command-line flags and their environment variables
//! take precedence; tool paths not configured anywhere are looked up on `PATH`.
//!
//! ```toml
//! adb = "/opt/android-sdk/platform-tools/adb"
//! aapt = "/opt/android-sdk/build-tools/34.0.0/aapt"
//! serial = "emulator-5554"
//! staging_dir = "/var/tmp"
//! backup_dir = "/home/me/apk-backups"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::paths;

/// Errors that can occur while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`Config`].
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },
}

/// Settings read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the `adb` executable.
    pub adb: Option<PathBuf>,
    /// Path to the `aapt` executable.
    pub aapt: Option<PathBuf>,
    /// Device serial to target when several devices are attached.
    pub serial: Option<String>,
    /// Parent directory for the per-run staging area (default: system temp dir).
    pub staging_dir: Option<PathBuf>,
    /// Where `adb backup` files are written.
    pub backup_dir: Option<PathBuf>,
}

impl Config {
    /// Load the config from the default location.
    ///
    /// A missing file (or an unresolvable home directory) yields the default
    /// config so first runs behave the same as configured ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        match paths::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load the config from an explicit path. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Directory for backups, falling back to `~/.apkpush/backups`.
    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(paths::default_backup_dir)
    }
}
