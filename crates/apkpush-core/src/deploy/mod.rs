//! Native library deployment.
//!
//! [`Deployer`] sequences the whole run:
//!
//! 1. Open the archive and index `lib/<abi>/*.so` entries.
//! 2. Stop here if there are none; the device is not touched.
//! 3. Probe the device ABI (failure means "unknown").
//! 4. Create the staging area.
//! 5. Run the [`RemoteTransaction`]: wipe `<target>/lib`, stage and push.
//! 6. Remove the staging area, whatever happened in step 5.

pub mod error;
pub mod transaction;

pub use error::DeployError;
pub use transaction::{RemoteTransaction, TransactionOutcome, check_target_dir};

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use apkpush_schema::{DeployStatus, DeploymentPlan, DeploymentReport};

use crate::device::{DeviceBridge, probe_abi};
use crate::io::archive::PackageArchive;
use crate::io::extract::StagingArea;
use crate::reporter::Reporter;

/// Deploys native libraries from package archives to one device.
pub struct Deployer<'a, B: ?Sized, R: ?Sized> {
    bridge: &'a B,
    reporter: &'a R,
    staging_parent: Option<PathBuf>,
}

impl<B: ?Sized, R: ?Sized> std::fmt::Debug for Deployer<'_, B, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer")
            .field("staging_parent", &self.staging_parent)
            .finish_non_exhaustive()
    }
}

impl<'a, B, R> Deployer<'a, B, R>
where
    B: DeviceBridge + ?Sized,
    R: Reporter + ?Sized,
{
    /// Deployer talking to `bridge` and reporting progress to `reporter`.
    pub fn new(bridge: &'a B, reporter: &'a R) -> Self {
        Self {
            bridge,
            reporter,
            staging_parent: None,
        }
    }

    /// Create staging areas under `dir` instead of the system temp dir.
    pub fn with_staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_parent = dir;
        self
    }

    /// Deploy the native libraries of the APK at `archive_path` into
    /// `<target_dir>/lib` on the device.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidTarget`] for an empty or root target,
    /// [`DeployError::ArchiveOpen`] if the archive cannot be read,
    /// [`DeployError::Staging`] if the staging area cannot be created, or
    /// [`DeployError::DirectoryReset`] if the device directory cannot be
    /// cleared. Failures of individual files are reported, not returned.
    pub fn deploy_native_libraries(
        &self,
        archive_path: &Path,
        target_dir: &str,
    ) -> Result<DeploymentReport, DeployError> {
        check_target_dir(target_dir)?;
        let mut archive = PackageArchive::open(archive_path)?;
        self.deploy_archive(&mut archive, target_dir)
    }

    /// [`deploy_native_libraries`](Self::deploy_native_libraries) for an
    /// already opened archive.
    ///
    /// # Errors
    ///
    /// See [`deploy_native_libraries`](Self::deploy_native_libraries).
    pub fn deploy_archive<Z: Read + Seek>(
        &self,
        archive: &mut PackageArchive<Z>,
        target_dir: &str,
    ) -> Result<DeploymentReport, DeployError> {
        check_target_dir(target_dir)?;
        self.reporter.section("Native libraries");

        if archive.index().is_empty() {
            tracing::info!(archive = %archive.path().display(), "No native libraries in archive");
            self.reporter.info("No native libraries found");
            return Ok(DeploymentReport::no_libraries());
        }

        let groups = archive.index().summaries();
        let abis: Vec<&str> = groups.iter().map(|g| g.abi.as_str()).collect();
        self.reporter
            .info(&format!("Found libraries for: {}", abis.join(", ")));

        let device_abi = probe_abi(self.bridge);
        match &device_abi {
            Some(abi) => self.reporter.info(&format!("Device architecture: {abi}")),
            None => self
                .reporter
                .warning("Could not determine device architecture, deploying all"),
        }

        let staging =
            StagingArea::new(self.staging_parent.as_deref()).map_err(DeployError::Staging)?;

        let transaction = RemoteTransaction::new(self.bridge, self.reporter, target_dir);
        let (index, zip) = archive.parts_mut();
        let result = transaction.run(zip, index, device_abi.as_ref(), staging.path());

        if let Err(e) = staging.close() {
            tracing::warn!(error = %e, "Failed to remove staging area");
        }

        let outcome = result?;
        let report = DeploymentReport {
            status: DeployStatus::Deployed,
            groups,
            device_abi,
            selection: Some(outcome.selection),
            lib_dir: Some(outcome.lib_dir),
            outcomes: outcome.outcomes,
        };

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Native library deployment finished"
        );
        Ok(report)
    }

    /// Compute what [`deploy_native_libraries`](Self::deploy_native_libraries)
    /// would do. Only the (read-only) architecture probe reaches the device.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidTarget`] for an empty or root target, or
    /// [`DeployError::ArchiveOpen`] if the archive cannot be read.
    pub fn plan(&self, archive_path: &Path, target_dir: &str) -> Result<DeploymentPlan, DeployError> {
        check_target_dir(target_dir)?;
        let archive = PackageArchive::open(archive_path)?;
        let index = archive.index();
        let lib_dir = transaction::lib_dir(target_dir);

        if index.is_empty() {
            return Ok(DeploymentPlan {
                groups: Vec::new(),
                device_abi: None,
                selection: None,
                lib_dir,
                files: Vec::new(),
            });
        }

        let device_abi = probe_abi(self.bridge);
        let (selection, groups) = transaction::select(index, device_abi.as_ref());
        let files = transaction::planned_files(&groups, &lib_dir);

        Ok(DeploymentPlan {
            groups: index.summaries(),
            device_abi,
            selection: Some(selection),
            lib_dir,
            files,
        })
    }
}
