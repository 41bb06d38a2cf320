//! Shared command context.
//!
//! Merges command-line flags with the config file once, so commands only
//! deal with resolved settings.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use apkpush_core::{AaptInspector, AdbBridge, Config};

use crate::Cli;

/// Settings every command runs with.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub adb: Option<PathBuf>,
    pub aapt: Option<PathBuf>,
    pub serial: Option<String>,
    pub staging_dir: Option<PathBuf>,
    pub backup_dir: PathBuf,
    pub verbose: bool,
    pub dry_run: bool,
    pub yes: bool,
}

impl Context {
    /// Load the config file and merge the global flags over it.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Ok(Self::new(cli, config))
    }

    /// Flags (and their environment variables) win over the config file.
    pub fn new(cli: &Cli, config: Config) -> Self {
        let backup_dir = config.backup_dir();
        Self {
            adb: cli.adb.clone().or(config.adb),
            aapt: cli.aapt.clone().or(config.aapt),
            serial: cli.serial.clone().or(config.serial),
            staging_dir: config.staging_dir,
            backup_dir,
            verbose: cli.verbose || cli.debug,
            dry_run: cli.dry_run,
            yes: cli.yes,
        }
    }

    pub fn bridge(&self) -> Result<AdbBridge> {
        Ok(AdbBridge::locate(self.adb.as_deref(), self.serial.clone())?)
    }

    pub fn inspector(&self) -> Result<AaptInspector> {
        Ok(AaptInspector::locate(self.aapt.as_deref())?)
    }

    /// Where the backup of `package` goes.
    pub fn backup_file(&self, package: &str) -> PathBuf {
        self.backup_dir.join(format!("{package}.ab"))
    }

    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging_dir.as_deref()
    }
}
