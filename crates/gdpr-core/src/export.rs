//! Top-level export and archive disposal.

use crate::staging::StagingDir;
use crate::{Error, Result};
use gdpr_bundle::{check_archive, pack, ArchiveStatus, BundleBuilder, BundleStats};
use gdpr_common::{Account, AccountDirectory, ProfileFormatter, RecordSource};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A finished export. The archive is the only artifact left on disk.
#[derive(Debug, Clone, Serialize)]
pub struct ExportHandle {
    path: PathBuf,
    account_id: String,
    stats: BundleStats,
}

impl ExportHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn stats(&self) -> &BundleStats {
        &self.stats
    }

    /// Move the archive into `directory`, keeping its file name.
    ///
    /// On failure the archive stays where it was and the handle is
    /// unchanged.
    pub fn relocate(&mut self, directory: &Path) -> Result<()> {
        let name = self.path.file_name().ok_or_else(|| {
            Error::InvalidArgument(format!("{} has no file name", self.path.display()))
        })?;
        fs::create_dir_all(directory)?;
        let target = directory.join(name);
        move_file(&self.path, &target)?;
        self.path = target;
        Ok(())
    }
}

fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // rename fails across filesystems
    if let Err(e) = fs::copy(from, to) {
        if let Err(cleanup) = fs::remove_file(to) {
            debug!(path = %to.display(), error = %cleanup, "No partial copy to remove");
        }
        return Err(e);
    }
    if let Err(e) = fs::remove_file(from) {
        warn!(path = %from.display(), error = %e, "Archive copied but the original could not be removed");
    }
    Ok(())
}

/// Outcome of [`dispose_archive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposal {
    Removed,
    AlreadyAbsent,
    /// The archive was valid but deleting it failed; the failure was logged.
    RemovalFailed,
    /// Something exists at the path but could not be opened; the failure
    /// was logged and nothing was deleted.
    Unreadable,
}

/// Delete an export archive.
///
/// A missing file, including a path under a non-directory, is a no-op. A
/// file that is not a ZIP archive is left in place and reported as an
/// invalid argument.
pub fn dispose_archive(path: &Path) -> Result<Disposal> {
    let status = match check_archive(path) {
        Ok(status) => status,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not open archive for disposal");
            return Ok(Disposal::Unreadable);
        }
    };

    match status {
        ArchiveStatus::Missing => {
            info!(path = %path.display(), "Archive already disposed");
            Ok(Disposal::AlreadyAbsent)
        }
        ArchiveStatus::NotAnArchive => Err(Error::InvalidArgument(format!(
            "{} is not a valid archive",
            path.display()
        ))),
        ArchiveStatus::Valid { .. } => match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "Archive disposed");
                Ok(Disposal::Removed)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not delete archive");
                Ok(Disposal::RemovalFailed)
            }
        },
    }
}

/// Drives staging, bundle assembly, packaging and cleanup for one account
/// at a time. Exports may run concurrently from several threads.
pub struct ExportCoordinator {
    builder: BundleBuilder,
    staging_root: PathBuf,
}

impl ExportCoordinator {
    pub fn new(
        source: Arc<dyn RecordSource>,
        formatter: Arc<dyn ProfileFormatter>,
        staging_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            builder: BundleBuilder::new(source, formatter),
            staging_root: staging_root.into(),
        }
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Export every record of `account` into a new archive.
    ///
    /// The staging directory is removed before this returns, whether the
    /// export succeeded or not.
    pub fn export(&self, account: &Account) -> Result<ExportHandle> {
        info!(uid = %account.uid, "Starting account data export");

        let result = self.export_staged(account);
        match &result {
            Ok(handle) => info!(
                uid = %account.uid,
                archive = %handle.path.display(),
                written = handle.stats.total_written(),
                skipped = handle.stats.total_skipped(),
                "Account data export finished"
            ),
            Err(e) => error!(uid = %account.uid, error = %e, "Account data export failed"),
        }
        result
    }

    fn export_staged(&self, account: &Account) -> Result<ExportHandle> {
        let staging = StagingDir::create(&self.staging_root, &account.uid)?;
        let bundle = self.builder.build(account, staging.path())?;
        let path = pack(&bundle.folder)?;
        drop(staging);

        Ok(ExportHandle {
            path,
            account_id: account.uid.clone(),
            stats: bundle.stats,
        })
    }

    /// Resolve `uid` through `directory`, then export it.
    pub fn export_uid(&self, directory: &dyn AccountDirectory, uid: &str) -> Result<ExportHandle> {
        let account = directory.find_by_uid(uid)?;
        self.export(&account)
    }

    /// Delete the archive behind `handle`. Safe to call more than once.
    pub fn dispose(&self, handle: &ExportHandle) -> Result<Disposal> {
        dispose_archive(&handle.path)
    }

    /// Move a finished archive into `directory`.
    ///
    /// If the move fails the archive is disposed of, so nothing is left
    /// behind in the staging root.
    pub fn deliver(&self, handle: &mut ExportHandle, directory: &Path) -> Result<()> {
        let e = match handle.relocate(directory) {
            Ok(()) => {
                info!(archive = %handle.path.display(), "Archive delivered");
                return Ok(());
            }
            Err(e) => e,
        };
        error!(
            archive = %handle.path.display(),
            target = %directory.display(),
            error = %e,
            "Could not deliver archive"
        );
        if let Err(dispose) = self.dispose(handle) {
            warn!(archive = %handle.path.display(), error = %dispose, "Undelivered archive was kept");
        }
        Err(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdpr_bundle::BundleError;
    use gdpr_common::{
        AccountRecords, DeletedRecords, ExtractorRecord, GeodocRecord, MemoryRecordSource,
        MetadataRecord, OgcStatisticsRecord, RecordCategory, RecordSink,
    };
    use tempfile::TempDir;

    struct UidFormatter;

    impl ProfileFormatter for UidFormatter {
        fn render(&self, account: &Account) -> gdpr_common::Result<String> {
            Ok(format!("dn: uid={}", account.uid))
        }
    }

    fn coordinator(source: MemoryRecordSource, root: &Path) -> ExportCoordinator {
        ExportCoordinator::new(Arc::new(source), Arc::new(UidFormatter), root)
    }

    /// Occupies the archive path of every staging directory under `root`
    /// with a directory while metadata is being read.
    struct ArchivePathTaken {
        inner: MemoryRecordSource,
        root: PathBuf,
    }

    impl RecordSource for ArchivePathTaken {
        fn visit_metadata(
            &self,
            account: &Account,
            sink: &mut dyn RecordSink<MetadataRecord>,
        ) -> gdpr_common::Result<()> {
            for entry in fs::read_dir(&self.root).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() && path.extension().is_none() {
                    fs::create_dir(path.with_extension("zip")).unwrap();
                }
            }
            self.inner.visit_metadata(account, sink)
        }

        fn visit_geodocs(
            &self,
            account: &Account,
            sink: &mut dyn RecordSink<GeodocRecord>,
        ) -> gdpr_common::Result<()> {
            self.inner.visit_geodocs(account, sink)
        }

        fn visit_extractor_log(
            &self,
            account: &Account,
            sink: &mut dyn RecordSink<ExtractorRecord>,
        ) -> gdpr_common::Result<()> {
            self.inner.visit_extractor_log(account, sink)
        }

        fn visit_ogc_stats(
            &self,
            account: &Account,
            sink: &mut dyn RecordSink<OgcStatisticsRecord>,
        ) -> gdpr_common::Result<()> {
            self.inner.visit_ogc_stats(account, sink)
        }

        fn delete_account_data(&self, account: &Account) -> gdpr_common::Result<DeletedRecords> {
            self.inner.delete_account_data(account)
        }
    }

    #[test]
    fn test_export_leaves_only_archive() {
        let temp = TempDir::new().unwrap();
        let source = MemoryRecordSource::new();
        source.insert(Account::new("jdoe"), AccountRecords::default());

        let handle = coordinator(source, temp.path())
            .export(&Account::new("jdoe"))
            .unwrap();

        assert_eq!(handle.account_id(), "jdoe");
        assert!(handle.path().is_file());
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(leftovers, vec![handle.path().to_path_buf()]);
    }

    #[test]
    fn test_failed_export_cleans_staging() {
        let temp = TempDir::new().unwrap();
        let source = MemoryRecordSource::new();
        source.fail_category(RecordCategory::OgcStats);

        let result = coordinator(source, temp.path()).export(&Account::new("jdoe"));

        assert!(matches!(
            result,
            Err(Error::Bundle(BundleError::Collection { .. }))
        ));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_packaging_failure_cleans_staging() {
        let temp = TempDir::new().unwrap();
        let source = ArchivePathTaken {
            inner: MemoryRecordSource::new(),
            root: temp.path().to_path_buf(),
        };
        let coordinator =
            ExportCoordinator::new(Arc::new(source), Arc::new(UidFormatter), temp.path());

        let result = coordinator.export(&Account::new("jdoe"));

        assert!(matches!(
            result,
            Err(Error::Bundle(BundleError::Packaging { .. }))
        ));
        let leftovers: Vec<PathBuf> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        // only the directory that blocked the archive path remains
        assert_eq!(leftovers.len(), 1);
        assert_eq!(leftovers[0].extension().unwrap(), "zip");
        assert!(leftovers[0].is_dir());
    }

    #[test]
    fn test_dispose_states() {
        let temp = TempDir::new().unwrap();
        let handle = coordinator(MemoryRecordSource::new(), temp.path())
            .export(&Account::new("jdoe"))
            .unwrap();

        assert_eq!(dispose_archive(handle.path()).unwrap(), Disposal::Removed);
        assert_eq!(
            dispose_archive(handle.path()).unwrap(),
            Disposal::AlreadyAbsent
        );

        let text = temp.path().join("report.zip");
        fs::write(&text, "not a zip").unwrap();
        assert!(matches!(
            dispose_archive(&text),
            Err(Error::InvalidArgument(_))
        ));
        assert!(text.exists());
    }

    #[test]
    fn test_dispose_path_under_a_file_is_already_absent() {
        let temp = TempDir::new().unwrap();
        let plain = temp.path().join("plain.txt");
        fs::write(&plain, "text").unwrap();

        assert_eq!(
            dispose_archive(&plain.join("jdoe-1.zip")).unwrap(),
            Disposal::AlreadyAbsent
        );
        assert!(plain.is_file());
    }

    #[test]
    fn test_relocate_moves_archive() {
        let temp = TempDir::new().unwrap();
        let mut handle = coordinator(MemoryRecordSource::new(), &temp.path().join("stage"))
            .export(&Account::new("jdoe"))
            .unwrap();
        let old = handle.path().to_path_buf();

        handle.relocate(&temp.path().join("out")).unwrap();

        assert!(!old.exists());
        assert!(handle.path().starts_with(temp.path().join("out")));
        assert!(handle.path().is_file());
    }

    #[test]
    fn test_failed_delivery_disposes_archive() {
        let temp = TempDir::new().unwrap();
        let stage = temp.path().join("stage");
        let coordinator = coordinator(MemoryRecordSource::new(), &stage);
        let mut handle = coordinator.export(&Account::new("jdoe")).unwrap();
        let occupied = temp.path().join("out");
        fs::write(&occupied, "a file, not a directory").unwrap();

        let result = coordinator.deliver(&mut handle, &occupied);

        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(fs::read_dir(&stage).unwrap().count(), 0);
        assert_eq!(
            fs::read_to_string(&occupied).unwrap(),
            "a file, not a directory"
        );
    }

    #[test]
    fn test_deliver_moves_archive() {
        let temp = TempDir::new().unwrap();
        let coordinator = coordinator(MemoryRecordSource::new(), &temp.path().join("stage"));
        let mut handle = coordinator.export(&Account::new("jdoe")).unwrap();

        coordinator
            .deliver(&mut handle, &temp.path().join("out"))
            .unwrap();

        assert!(handle.path().starts_with(temp.path().join("out")));
        assert_eq!(coordinator.dispose(&handle).unwrap(), Disposal::Removed);
    }
}
