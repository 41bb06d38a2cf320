//! Random-access view of an APK and its native library layout.
//!
//! An APK is a ZIP container; native libraries live at
//! `lib/<abi>/<name>.so`. Only the central directory is read to build the
//! index; entry contents are streamed later by the staging extractor.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use apkpush_schema::{Abi, GroupSummary, NATIVE_LIB_ROOT, SHARED_LIB_SUFFIX};
use zip::ZipArchive;

use crate::deploy::DeployError;

/// Libraries sharing one ABI tag, in archive order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchGroup {
    /// ABI tag from the second path segment
    pub abi: Abi,
    /// Archive entry paths
    pub entries: Vec<String>,
}

/// Native libraries of an archive, grouped by ABI.
///
/// Groups keep the order in which their ABI first appeared in the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryIndex {
    groups: Vec<ArchGroup>,
}

impl LibraryIndex {
    /// Build an index from entry names in archive order.
    pub fn from_entries<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = Self::default();
        for name in names {
            if let Some(abi) = classify_entry(name) {
                index.insert(abi, name);
            }
        }
        index
    }

    fn insert(&mut self, abi: Abi, entry: &str) {
        if let Some(group) = self.groups.iter_mut().find(|g| g.abi == abi) {
            group.entries.push(entry.to_string());
        } else {
            self.groups.push(ArchGroup {
                abi,
                entries: vec![entry.to_string()],
            });
        }
    }

    /// Whether the archive ships no native libraries.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All groups, in archive order.
    pub fn groups(&self) -> &[ArchGroup] {
        &self.groups
    }

    /// The group for `abi`, if the archive ships one.
    pub fn group(&self, abi: &Abi) -> Option<&ArchGroup> {
        self.groups.iter().find(|g| &g.abi == abi)
    }

    /// The ABI tags present, in archive order.
    pub fn abis(&self) -> impl Iterator<Item = &Abi> {
        self.groups.iter().map(|g| &g.abi)
    }

    /// Total number of libraries across all groups.
    pub fn library_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    /// Group summaries for reports.
    pub fn summaries(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .map(|g| GroupSummary {
                abi: g.abi.clone(),
                libraries: g.entries.len(),
            })
            .collect()
    }
}

/// Classify an archive entry name.
///
/// Returns the ABI for `lib/<abi>/.../<name>.so`. Names outside `lib/`,
/// without the `.so` suffix, with fewer than three segments, or with an
/// empty ABI segment are not libraries.
pub fn classify_entry(name: &str) -> Option<Abi> {
    if !name.starts_with(NATIVE_LIB_ROOT) || !name.ends_with(SHARED_LIB_SUFFIX) {
        return None;
    }

    let segments: Vec<&str> = name.split('/').collect();
    if segments.len() < 3 {
        tracing::debug!(entry = name, "Ignoring library outside an ABI directory");
        return None;
    }
    if segments[1].is_empty() {
        tracing::debug!(entry = name, "Ignoring library with empty ABI segment");
        return None;
    }

    Some(Abi::parse(segments[1]))
}

/// An opened package archive together with its library index.
pub struct PackageArchive<R = File> {
    path: PathBuf,
    zip: ZipArchive<R>,
    index: LibraryIndex,
}

impl<R> std::fmt::Debug for PackageArchive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageArchive")
            .field("path", &self.path)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl PackageArchive<File> {
    /// Open an APK from disk and index its native libraries.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::ArchiveOpen`] if the file cannot be opened or is
    /// not a valid ZIP container.
    pub fn open(path: &Path) -> Result<Self, DeployError> {
        let file = File::open(path).map_err(|e| DeployError::ArchiveOpen {
            path: path.to_path_buf(),
            source: zip::result::ZipError::Io(e),
        })?;
        Self::from_reader(file, path)
    }
}

impl<R: Read + Seek> PackageArchive<R> {
    /// Index an archive from any seekable reader. `path` is only used for
    /// messages.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::ArchiveOpen`] if the central directory cannot
    /// be read.
    pub fn from_reader(reader: R, path: &Path) -> Result<Self, DeployError> {
        let open_err = |source| DeployError::ArchiveOpen {
            path: path.to_path_buf(),
            source,
        };

        let mut zip = ZipArchive::new(reader).map_err(open_err)?;

        // Enumerate by index: central-directory order is the archive order.
        let mut names = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let entry = zip.by_index_raw(i).map_err(open_err)?;
            names.push(entry.name().to_string());
        }
        let index = LibraryIndex::from_entries(names.iter().map(String::as_str));

        tracing::debug!(
            archive = %path.display(),
            entries = names.len(),
            libraries = index.library_count(),
            "Indexed archive"
        );

        Ok(Self {
            path: path.to_path_buf(),
            zip,
            index,
        })
    }

    /// The native library index.
    pub fn index(&self) -> &LibraryIndex {
        &self.index
    }

    /// Path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The index together with the ZIP reader, for streaming entries while
    /// walking the groups.
    pub fn parts_mut(&mut self) -> (&LibraryIndex, &mut ZipArchive<R>) {
        (&self.index, &mut self.zip)
    }
}
