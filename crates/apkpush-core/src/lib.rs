//! Core library for apkpush: index the native libraries of an APK and
//! deploy them to a device over adb.

pub mod config;
pub mod deploy;
pub mod device;
pub mod inspect;
pub mod io;
pub mod paths;
pub mod reporter;

pub use config::{Config, ConfigError};
pub use deploy::{DeployError, Deployer};
pub use device::{AdbBridge, BridgeError, CommandOutput, DeviceBridge};
pub use inspect::{AaptInspector, InspectError, PackageInspector};
pub use io::archive::{LibraryIndex, PackageArchive};
pub use paths::*;
pub use reporter::{NullReporter, Reporter};
