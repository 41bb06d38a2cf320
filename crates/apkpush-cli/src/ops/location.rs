//! Where the app lives on the device.

use anyhow::{Context as _, Result};
use apkpush_core::deploy::check_target_dir;
use apkpush_core::device::{DeviceBridge, remote, resolve_install_path};
use apkpush_schema::PackageId;
use serde::Serialize;

/// Install location of an app on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallLocation {
    /// App directory; native libraries go to `<target_dir>/lib`
    pub target_dir: String,
    /// Installed APK to replace
    pub apk_path: String,
}

impl InstallLocation {
    /// A directory given by the user. The APK goes to `<dir>/base.apk`.
    ///
    /// Blank directories and `/` are rejected: both would put the library
    /// directory at the device root.
    pub fn explicit(target_dir: &str) -> Result<Self> {
        check_target_dir(target_dir)?;
        let target_dir = target_dir.trim();
        Ok(Self {
            target_dir: remote::normalize(target_dir),
            apk_path: remote::join(target_dir, &["base.apk"]),
        })
    }

    /// Ask the package manager where `package` is installed.
    pub fn resolve<B: DeviceBridge + ?Sized>(bridge: &B, package: &PackageId) -> Result<Self> {
        let apk_path = resolve_install_path(bridge, package)
            .with_context(|| format!("Failed to locate {package} on the device"))?;
        tracing::info!(package = %package, apk = %apk_path, "Resolved install path");
        Ok(Self {
            target_dir: remote::parent(&apk_path),
            apk_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apkpush_core::device::{BridgeError, CommandOutput};
    use std::path::Path;

    struct Pm(&'static str);

    impl DeviceBridge for Pm {
        fn shell(&self, _: &[&str]) -> Result<CommandOutput, BridgeError> {
            Ok(CommandOutput::ok(self.0))
        }

        fn push(&self, _: &Path, _: &str) -> Result<CommandOutput, BridgeError> {
            unreachable!()
        }
    }

    #[test]
    fn test_explicit_target() {
        let location = InstallLocation::explicit("/system/priv-app/Settings/").unwrap();
        assert_eq!(location.target_dir, "/system/priv-app/Settings");
        assert_eq!(location.apk_path, "/system/priv-app/Settings/base.apk");
    }

    #[test]
    fn test_explicit_target_rejects_root_and_blank() {
        for target in ["", " \t", "/", "///"] {
            let err = InstallLocation::explicit(target).unwrap_err();
            assert!(err.to_string().contains("Invalid target directory"), "{target:?}");
        }
    }

    #[test]
    fn test_resolved_target() {
        let bridge = Pm("package:/data/app/~~x==/com.example-1/base.apk\n");
        let package = PackageId::new("com.example").unwrap();
        let location = InstallLocation::resolve(&bridge, &package).unwrap();
        assert_eq!(location.target_dir, "/data/app/~~x==/com.example-1");
        assert_eq!(location.apk_path, "/data/app/~~x==/com.example-1/base.apk");
    }

    #[test]
    fn test_not_installed() {
        let package = PackageId::new("com.missing").unwrap();
        let err = InstallLocation::resolve(&Pm(""), &package).unwrap_err();
        assert!(err.to_string().contains("com.missing"));
    }
}
