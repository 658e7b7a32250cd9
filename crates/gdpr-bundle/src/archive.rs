//! Packing a staging tree into a ZIP archive.
//!
//! The archive is written next to the directory it packs, named after it
//! (`<dir>.zip`). It is first written under a `.partial` name and only
//! renamed into place once finalized, so a half-written archive is never
//! visible under the final name.

use crate::{BundleError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// File extension of packed bundles.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// One file or directory to add, with its archive-relative name.
#[derive(Debug)]
struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Where [`pack`] places the archive for `directory`.
pub fn archive_path_for(directory: &Path) -> Result<PathBuf> {
    let name = directory.file_name().ok_or_else(|| BundleError::Packaging {
        path: directory.to_path_buf(),
        reason: "directory has no name".to_string(),
    })?;
    let parent = directory.parent().unwrap_or_else(|| Path::new("."));

    let mut file_name = name.to_os_string();
    file_name.push(".");
    file_name.push(ARCHIVE_EXTENSION);
    Ok(parent.join(file_name))
}

/// Compress `directory` into `<directory>.zip` beside it.
///
/// Entries are added in sorted path order with a fixed timestamp, so the
/// archive only depends on the directory's contents. The source tree is
/// left untouched.
pub fn pack(directory: &Path) -> Result<PathBuf> {
    let target = archive_path_for(directory)?;
    let mut partial_name = target.as_os_str().to_os_string();
    partial_name.push(".partial");
    let partial = PathBuf::from(partial_name);

    info!(
        source = %directory.display(),
        target = %target.display(),
        "Compressing account data"
    );

    let packed = collect_entries(directory)
        .map_err(BundleError::from)
        .and_then(|entries| write_archive(&partial, &entries).map(|()| entries.len()))
        .and_then(|count| {
            fs::rename(&partial, &target)?;
            Ok(count)
        });

    match packed {
        Ok(entries) => {
            info!(path = %target.display(), entries, "Archive created");
            Ok(target)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&partial) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %cleanup, "Could not remove partial archive");
                }
            }
            Err(BundleError::Packaging {
                path: directory.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}

fn collect_entries(root: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    walk(root, root, &mut entries)?;
    Ok(entries)
}

fn walk(root: &Path, dir: &Path, entries: &mut Vec<Entry>) -> io::Result<()> {
    let mut children = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    children.sort();

    for path in children {
        let file_type = fs::symlink_metadata(&path)?.file_type();
        let name = entry_name(root, &path);
        if file_type.is_dir() {
            entries.push(Entry {
                name,
                path: path.clone(),
                is_dir: true,
            });
            walk(root, &path, entries)?;
        } else if file_type.is_file() {
            entries.push(Entry {
                name,
                path,
                is_dir: false,
            });
        } else {
            debug!(path = %path.display(), "Skipping non-regular file");
        }
    }
    Ok(())
}

/// Archive-relative name with `/` separators.
fn entry_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_archive(target: &Path, entries: &[Entry]) -> Result<()> {
    let file = File::create(target)?;
    let mut zip = ZipWriter::new(file);

    let options: FileOptions<'_, ()> = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);
    let dir_options: FileOptions<'_, ()> = options.unix_permissions(0o755);

    for entry in entries {
        if entry.is_dir {
            zip.add_directory(entry.name.as_str(), dir_options)?;
        } else {
            zip.start_file(entry.name.as_str(), options)?;
            let mut source = File::open(&entry.path)?;
            io::copy(&mut source, &mut zip)?;
        }
        debug!(entry = %entry.name, "Added archive entry");
    }

    zip.finish()?.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchiveReader;
    use tempfile::TempDir;

    fn populate(root: &Path) {
        fs::create_dir_all(root.join("metadata")).unwrap();
        fs::create_dir_all(root.join("geodocs")).unwrap();
        fs::write(root.join("account_info.ldif"), "dn: uid=jdoe").unwrap();
        fs::write(root.join("geodocs/geodocs.csv"), "header\n").unwrap();
    }

    #[test]
    fn test_archive_path_is_adjacent() {
        let path = archive_path_for(Path::new("/tmp/staging/jdoe-1234")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/staging/jdoe-1234.zip"));
    }

    #[test]
    fn test_pack_keeps_tree_and_empty_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("jdoe-1");
        populate(&root);

        let zip_path = pack(&root).unwrap();

        assert_eq!(zip_path, temp.path().join("jdoe-1.zip"));
        assert!(root.join("account_info.ldif").exists());
        assert!(!temp.path().join("jdoe-1.zip.partial").exists());

        let reader = ArchiveReader::open(&zip_path).unwrap();
        assert_eq!(
            reader.entry_names(),
            vec![
                "account_info.ldif",
                "geodocs/",
                "geodocs/geodocs.csv",
                "metadata/",
            ]
        );
    }

    #[test]
    fn test_pack_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("a").join("bundle");
        let second = temp.path().join("b").join("bundle");
        populate(&first);
        populate(&second);

        let a = fs::read(pack(&first).unwrap()).unwrap();
        let b = fs::read(pack(&second).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pack_missing_directory_fails_without_leftovers() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("absent");

        let result = pack(&root);

        assert!(matches!(result, Err(BundleError::Packaging { .. })));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
