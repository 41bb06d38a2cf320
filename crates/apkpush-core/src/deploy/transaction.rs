//! Remote deployment transaction.
//!
//! Wipes `<target>/lib` on the device, then stages and pushes the selected
//! libraries one by one. The wipe is all-or-nothing; everything after it is
//! per-file and keeps going past failures.

use std::io::{Read, Seek};
use std::path::Path;

use apkpush_schema::{Abi, FailureStage, FileFailure, FileOutcome, PlannedFile, Selection};
use zip::ZipArchive;

use super::DeployError;
use crate::device::{DeviceBridge, remote};
use crate::io::archive::{ArchGroup, LibraryIndex};
use crate::io::extract::extract_entry;
use crate::reporter::Reporter;

/// Decide which groups to process.
///
/// A known device ABI that the archive ships selects that group alone.
/// An unknown ABI, or one the archive has no libraries for, selects every
/// group in archive order.
pub fn select<'a>(
    index: &'a LibraryIndex,
    device_abi: Option<&Abi>,
) -> (Selection, Vec<&'a ArchGroup>) {
    if let Some(group) = device_abi.and_then(|abi| index.group(abi)) {
        return (Selection::Single(group.abi.clone()), vec![group]);
    }
    if let Some(abi) = device_abi {
        tracing::warn!(abi = %abi, "Archive has no libraries for the device ABI, deploying all");
    }
    (Selection::All, index.groups().iter().collect())
}

/// Reject target directories whose `lib` subdirectory is not inside an app
/// directory: empty or blank strings, and the device root.
///
/// # Errors
///
/// Returns [`DeployError::InvalidTarget`] for such a target.
pub fn check_target_dir(target_dir: &str) -> Result<(), DeployError> {
    let trimmed = target_dir.trim();
    if trimmed.is_empty() || remote::normalize(trimmed) == "/" {
        return Err(DeployError::InvalidTarget {
            target: target_dir.to_string(),
        });
    }
    Ok(())
}

/// Device-side library directory for a target: `<target>/lib`.
pub fn lib_dir(target_dir: &str) -> String {
    remote::join(target_dir, &["lib"])
}

/// Device-side path for one library: `<lib_dir>/<abi>/<basename>`.
pub fn remote_library_path(lib_dir: &str, abi: &Abi, entry: &str) -> String {
    remote::join(lib_dir, &[abi.as_str(), remote::basename(entry)])
}

/// Every file the selected groups would push, in processing order.
pub fn planned_files(groups: &[&ArchGroup], lib_dir: &str) -> Vec<PlannedFile> {
    groups
        .iter()
        .flat_map(|group| {
            group.entries.iter().map(|entry| PlannedFile {
                abi: group.abi.clone(),
                entry: entry.clone(),
                remote_path: remote_library_path(lib_dir, &group.abi, entry),
            })
        })
        .collect()
}

/// What a completed transaction did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// Which groups were processed
    pub selection: Selection,
    /// Device directory that was rebuilt
    pub lib_dir: String,
    /// One entry per attempted file, in processing order
    pub outcomes: Vec<FileOutcome>,
}

/// One wipe-and-rebuild of a device library directory.
pub struct RemoteTransaction<'a, B: ?Sized, R: ?Sized> {
    bridge: &'a B,
    reporter: &'a R,
    lib_dir: String,
}

impl<B: ?Sized, R: ?Sized> std::fmt::Debug for RemoteTransaction<'_, B, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTransaction")
            .field("lib_dir", &self.lib_dir)
            .finish_non_exhaustive()
    }
}

impl<'a, B, R> RemoteTransaction<'a, B, R>
where
    B: DeviceBridge + ?Sized,
    R: Reporter + ?Sized,
{
    /// Transaction on `<target_dir>/lib`. `target_dir` should already have
    /// passed [`check_target_dir`].
    pub fn new(bridge: &'a B, reporter: &'a R, target_dir: &str) -> Self {
        Self {
            bridge,
            reporter,
            lib_dir: lib_dir(target_dir),
        }
    }

    /// The directory this transaction owns.
    pub fn lib_dir(&self) -> &str {
        &self.lib_dir
    }

    /// Run the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::DirectoryReset`] if the library directory could
    /// not be removed. Per-file failures are recorded in the outcome instead.
    pub fn run<Z: Read + Seek>(
        &self,
        zip: &mut ZipArchive<Z>,
        index: &LibraryIndex,
        device_abi: Option<&Abi>,
        staging_root: &Path,
    ) -> Result<TransactionOutcome, DeployError> {
        self.reset_lib_dir()?;

        let (selection, groups) = select(index, device_abi);
        let mut outcomes = Vec::with_capacity(groups.iter().map(|g| g.entries.len()).sum());

        for group in groups {
            self.reporter.group_started(&group.abi, group.entries.len());
            tracing::info!(abi = %group.abi, files = group.entries.len(), "Deploying libraries");

            for entry in &group.entries {
                outcomes.push(self.deploy_file(zip, &group.abi, entry, staging_root));
            }
        }

        Ok(TransactionOutcome {
            selection,
            lib_dir: self.lib_dir.clone(),
            outcomes,
        })
    }

    fn reset_lib_dir(&self) -> Result<(), DeployError> {
        tracing::info!(dir = %self.lib_dir, "Removing library directory");
        self.reporter.info(&format!("Removing {}", self.lib_dir));

        let output = self
            .bridge
            .shell(&["rm", "-rf", &self.lib_dir])
            .map_err(|e| DeployError::DirectoryReset {
                dir: self.lib_dir.clone(),
                detail: e.to_string(),
            })?;

        if !output.success() {
            return Err(DeployError::DirectoryReset {
                dir: self.lib_dir.clone(),
                detail: output.failure_detail(),
            });
        }
        Ok(())
    }

    fn deploy_file<Z: Read + Seek>(
        &self,
        zip: &mut ZipArchive<Z>,
        abi: &Abi,
        entry: &str,
        staging_root: &Path,
    ) -> FileOutcome {
        let remote_path = remote_library_path(&self.lib_dir, abi, entry);
        let outcome = |failure: Option<FileFailure>| FileOutcome {
            abi: abi.clone(),
            entry: entry.to_string(),
            remote_path: remote_path.clone(),
            failure,
        };

        let local_path = match extract_entry(zip, entry, staging_root) {
            Ok(path) => path,
            Err(e) => return outcome(Some(self.fail(entry, FailureStage::Extract, e.to_string()))),
        };

        // Best effort: a real problem will surface in the push.
        let remote_dir = remote::parent(&remote_path);
        match self.bridge.shell(&["mkdir", "-p", &remote_dir]) {
            Ok(output) if output.success() => {}
            Ok(output) => {
                tracing::warn!(dir = %remote_dir, detail = %output.failure_detail(), "mkdir failed");
            }
            Err(e) => tracing::warn!(dir = %remote_dir, error = %e, "mkdir failed"),
        }

        let reason = match self.bridge.push(&local_path, &remote_path) {
            Ok(output) if output.success() => None,
            Ok(output) => Some(output.failure_detail()),
            Err(e) => Some(e.to_string()),
        };

        match reason {
            None => {
                tracing::info!(entry, remote = %remote_path, "Pushed library");
                self.reporter.file_pushed(entry, &remote_path);
                outcome(None)
            }
            Some(reason) => outcome(Some(self.fail(entry, FailureStage::Push, reason))),
        }
    }

    fn fail(&self, entry: &str, stage: FailureStage, reason: String) -> FileFailure {
        tracing::warn!(entry, %stage, reason = %reason, "Library failed, continuing");
        self.reporter.file_failed(entry, stage, &reason);
        FileFailure { stage, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LibraryIndex {
        LibraryIndex::from_entries([
            "lib/arm64-v8a/liba.so",
            "lib/arm64-v8a/libb.so",
            "lib/x86/libc.so",
        ])
    }

    #[test]
    fn test_select_matching_group_only() {
        let index = index();
        let (selection, groups) = select(&index, Some(&Abi::Arm64V8a));
        assert_eq!(selection, Selection::Single(Abi::Arm64V8a));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].abi, Abi::Arm64V8a);
    }

    #[test]
    fn test_select_all_when_unknown() {
        let index = index();
        let (selection, groups) = select(&index, None);
        assert_eq!(selection, Selection::All);
        let abis: Vec<_> = groups.iter().map(|g| g.abi.clone()).collect();
        assert_eq!(abis, vec![Abi::Arm64V8a, Abi::X86]);
    }

    #[test]
    fn test_select_all_when_device_abi_not_shipped() {
        let index = index();
        let (selection, groups) = select(&index, Some(&Abi::X86_64));
        assert_eq!(selection, Selection::All);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_select_other_abi_matches_by_name() {
        let index = LibraryIndex::from_entries(["lib/riscv64/libr.so", "lib/x86/libc.so"]);
        let device = Abi::parse("riscv64");
        let (selection, groups) = select(&index, Some(&device));
        assert_eq!(selection, Selection::Single(device));
        assert_eq!(groups[0].entries, vec!["lib/riscv64/libr.so"]);
    }

    #[test]
    fn test_check_target_dir() {
        assert!(check_target_dir("/data/app/com.x-1").is_ok());
        assert!(check_target_dir("/system/priv-app/Settings/").is_ok());
        for bad in ["", "   ", "/", "//", "\\"] {
            assert!(
                matches!(check_target_dir(bad), Err(DeployError::InvalidTarget { .. })),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn test_remote_paths() {
        assert_eq!(lib_dir("/data/app/com.x-1/"), "/data/app/com.x-1/lib");
        assert_eq!(
            remote_library_path("/data/app/com.x-1/lib", &Abi::X86, "lib/x86/nested/libc.so"),
            "/data/app/com.x-1/lib/x86/libc.so"
        );
    }

    #[test]
    fn test_planned_files_follow_selection() {
        let index = index();
        let (_, groups) = select(&index, None);
        let files = planned_files(&groups, "/t/lib");
        let remotes: Vec<_> = files.iter().map(|f| f.remote_path.as_str()).collect();
        assert_eq!(
            remotes,
            vec!["/t/lib/arm64-v8a/liba.so", "/t/lib/arm64-v8a/libb.so", "/t/lib/x86/libc.so"]
        );
    }
}
