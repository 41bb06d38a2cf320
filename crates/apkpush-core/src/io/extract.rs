//! Staging extractor
//!
//! Copies single archive entries into a process-private staging directory,
//! mirroring their path inside the archive.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

/// Why one entry could not be staged.
#[derive(Error, Debug)]
pub enum StageError {
    /// No entry with that exact name.
    #[error("Entry not found in archive: {entry}")]
    EntryNotFound {
        /// Archive entry path
        entry: String,
    },

    /// The entry name is absolute or climbs out with `..`.
    #[error("Refusing to extract {entry}: path escapes the staging area")]
    UnsafePath {
        /// Archive entry path
        entry: String,
    },

    /// Reading, decompressing or writing failed.
    #[error("Failed to extract {entry}: {source}")]
    Extraction {
        /// Archive entry path
        entry: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl StageError {
    fn extraction(entry: &str, source: impl Into<io::Error>) -> Self {
        Self::Extraction {
            entry: entry.to_string(),
            source: source.into(),
        }
    }
}

/// A disposable staging directory for one deployment run.
///
/// The directory and everything in it is removed when the guard is dropped,
/// including on early returns and panics.
#[derive(Debug)]
pub struct StagingArea {
    temp_dir: tempfile::TempDir,
}

impl StagingArea {
    /// Create a new staging area under `parent`, or the system temp dir.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(parent: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("apkpush-stage-");

        let temp_dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        tracing::debug!(path = %temp_dir.path().display(), "Created staging area");
        Ok(Self { temp_dir })
    }

    /// Access the root path
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Remove the staging area now, reporting any failure.
    ///
    /// Dropping the guard also removes it, but silently.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory could not be fully removed.
    pub fn close(self) -> io::Result<()> {
        let path = self.temp_dir.path().to_path_buf();
        self.temp_dir.close()?;
        tracing::debug!(path = %path.display(), "Removed staging area");
        Ok(())
    }
}

/// Extract one entry from `archive` to `<staging_root>/<entry path>`.
///
/// The entry is located by exact name and its decompressed bytes are copied
/// unchanged. Returns the path of the staged file.
///
/// # Errors
///
/// Returns [`StageError::EntryNotFound`] if the archive has no such entry,
/// [`StageError::UnsafePath`] if the name would land outside `staging_root`,
/// or [`StageError::Extraction`] for any I/O failure along the way.
pub fn extract_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    entry: &str,
    staging_root: &Path,
) -> Result<PathBuf, StageError> {
    let mut file = match archive.by_name(entry) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            return Err(StageError::EntryNotFound {
                entry: entry.to_string(),
            });
        }
        Err(e) => return Err(StageError::extraction(entry, e)),
    };

    // Sanitize path to prevent Zip Slip
    let relative_path = file
        .enclosed_name()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| StageError::UnsafePath {
            entry: entry.to_string(),
        })?;
    let dest = staging_root.join(&relative_path);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| StageError::extraction(entry, e))?;
    }

    let mut outfile = File::create(&dest).map_err(|e| StageError::extraction(entry, e))?;
    io::copy(&mut file, &mut outfile).map_err(|e| StageError::extraction(entry, e))?;

    tracing::debug!(entry, staged = %dest.display(), "Staged archive entry");
    Ok(dest)
}
