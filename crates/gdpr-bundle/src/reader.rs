//! Reading and validating packed bundles.

use crate::{BundleError, Result};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// What [`check_archive`] found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveStatus {
    /// Nothing exists at the path.
    Missing,
    /// A readable ZIP archive with this many entries.
    Valid { entries: usize },
    /// A file exists but is not a ZIP archive.
    NotAnArchive,
}

/// Determine whether `path` holds a structurally valid ZIP archive.
///
/// A path that cannot exist (missing, or under a non-directory) is
/// [`ArchiveStatus::Missing`]. Failing to open an existing file is returned
/// as an error; anything that opens but does not parse as a ZIP is
/// [`ArchiveStatus::NotAnArchive`].
pub fn check_archive(path: &Path) -> Result<ArchiveStatus> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if is_absent(&e) => return Ok(ArchiveStatus::Missing),
        Err(e) => return Err(e.into()),
    };

    match ZipArchive::new(file) {
        Ok(archive) => Ok(ArchiveStatus::Valid {
            entries: archive.len(),
        }),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Not a ZIP archive");
            Ok(ArchiveStatus::NotAnArchive)
        }
    }
}

fn is_absent(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Read access to a packed bundle.
pub struct ArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl ArchiveReader<File> {
    /// Open an archive from a file path.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file).map_err(|e| match e {
            BundleError::Zip(_) => BundleError::NotAnArchive(path.to_path_buf()),
            other => other,
        })
    }
}

impl ArchiveReader<Cursor<Vec<u8>>> {
    /// Open an archive from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Number of entries, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// All entry names in sorted order. Directory names end with `/`.
    pub fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Entry names directly or transitively under a directory prefix,
    /// excluding the directory entry itself.
    pub fn entries_under(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.entry_names()
            .into_iter()
            .filter(|n| n.starts_with(&prefix) && n.len() > prefix.len())
            .collect()
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Read an entry's bytes.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self
            .archive
            .by_name(name)
            .map_err(|_| BundleError::EntryNotFound(name.to_string()))?;

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read an entry as UTF-8 text (lossy).
    pub fn read_to_string(&mut self, name: &str) -> Result<String> {
        let data = self.read(name)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
