//! apkpush - push an APK and its native libraries to an Android device
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Replaces the APK of an already installed package in place (typically a
//! system app on a rooted or engineering build) and redeploys the native
//! libraries it ships for the device's architecture.
//!
//! # Flow of `apkpush push`
//!
//! ```text
//! adb devices            check a device is ready
//! aapt dump badging      read the package id
//! adb backup             optional
//! pm path <pkg>          find the installed APK (unless --target)
//! adb push               replace the APK
//! rm -rf <target>/lib    then push lib/<abi>/*.so for the device ABI
//! sync; stop; start      optional framework restart
//! ```

pub mod cmd;
pub mod ops;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "apkpush")]
#[command(author, version, about = "apkpush - push an APK and its native libraries to an Android device")]
pub struct Cli {
    /// Path to the adb executable (default: config file, then PATH)
    #[arg(long, global = true, env = "APKPUSH_ADB")]
    pub adb: Option<PathBuf>,

    /// Path to the aapt executable (default: config file, then PATH)
    #[arg(long, global = true, env = "APKPUSH_AAPT")]
    pub aapt: Option<PathBuf>,

    /// Serial of the device to target
    #[arg(short, long, global = true, env = "ANDROID_SERIAL")]
    pub serial: Option<String>,

    /// Show progress logs and system information
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show debug logs, including every device command
    #[arg(long, global = true)]
    pub debug: bool,

    /// Show what would happen without changing the device
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replace an installed APK and redeploy its native libraries
    Push {
        /// APK file to push
        apk: PathBuf,
        /// Device directory of the installed app (default: from `pm path`)
        #[arg(long)]
        target: Option<String>,
        /// Back up app data with `adb backup` first
        #[arg(long)]
        backup: bool,
        /// Do not deploy native libraries
        #[arg(long)]
        skip_so: bool,
        /// Restart the Android framework afterwards without asking
        #[arg(long)]
        restart: bool,
        /// Print a JSON summary instead of progress output
        #[arg(long)]
        json: bool,
    },
    /// Deploy only the native libraries of an APK
    Libs {
        /// APK file to read libraries from
        apk: PathBuf,
        /// Device directory of the installed app (default: from `pm path`)
        #[arg(long)]
        target: Option<String>,
        /// Print the deployment report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show host, tool and device information
    Info,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "apkpush", "push", "app.apk", "--target", "/system/app/Foo", "--dry-run", "-y", "-s",
            "emulator-5554",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert!(cli.yes);
        assert_eq!(cli.serial.as_deref(), Some("emulator-5554"));
        match cli.command {
            Commands::Push { apk, target, .. } => {
                assert_eq!(apk, PathBuf::from("app.apk"));
                assert_eq!(target.as_deref(), Some("/system/app/Foo"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_log_level() {
        let cli = Cli::try_parse_from(["apkpush", "info"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
        let cli = Cli::try_parse_from(["apkpush", "-v", "info"]).unwrap();
        assert_eq!(cli.log_level(), "info");
        let cli = Cli::try_parse_from(["apkpush", "-v", "--debug", "info"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
    }
}
