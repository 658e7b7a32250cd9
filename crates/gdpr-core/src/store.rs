//! Record source backed by a directory of JSON-lines files.
//!
//! Layout, one directory per account:
//! ```text
//! <root>/<uid>/account.json
//! <root>/<uid>/metadata.jsonl
//! <root>/<uid>/geodocs.jsonl
//! <root>/<uid>/extractor.jsonl
//! <root>/<uid>/ogcstats.jsonl
//! ```
//! Each `.jsonl` file holds one serialized record per line.

use gdpr_common::format::sanitize_component;
use gdpr_common::{
    Account, AccountDirectory, AccountRecords, DataAccessError, DeletedRecords, ExtractorRecord,
    GeodocRecord, MetadataRecord, OgcStatisticsRecord, RecordCategory, RecordSink, RecordSource,
    Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ACCOUNT_FILE_NAME: &str = "account.json";

/// A directory of per-account JSONL files.
#[derive(Debug, Clone)]
pub struct JsonlRecordSource {
    root: PathBuf,
}

impl JsonlRecordSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn account_dir(&self, uid: &str) -> PathBuf {
        self.root.join(sanitize_component(uid))
    }

    fn category_file(&self, uid: &str, category: RecordCategory) -> PathBuf {
        self.account_dir(uid)
            .join(format!("{}.jsonl", category.name()))
    }

    /// Write an account and its records, replacing whatever was stored.
    pub fn store(&self, account: &Account, records: &AccountRecords) -> Result<()> {
        let dir = self.account_dir(&account.uid);
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(account)
            .map_err(|e| DataAccessError::Malformed(e.to_string()))?;
        fs::write(dir.join(ACCOUNT_FILE_NAME), json)?;

        for category in RecordCategory::ALL {
            let path = self.category_file(&account.uid, category);
            match category {
                RecordCategory::Metadata => write_lines(&path, &records.metadata)?,
                RecordCategory::Geodocs => write_lines(&path, &records.geodocs)?,
                RecordCategory::ExtractorLog => write_lines(&path, &records.extractor)?,
                RecordCategory::OgcStats => write_lines(&path, &records.ogc_stats)?,
            }
        }
        debug!(uid = %account.uid, dir = %dir.display(), "Stored account records");
        Ok(())
    }

    /// Feed every well-formed line of one category file to `sink`.
    fn stream<T: DeserializeOwned>(
        &self,
        account: &Account,
        category: RecordCategory,
        sink: &mut dyn RecordSink<T>,
    ) -> Result<()> {
        let path = self.category_file(&account.uid, category);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(uid = %account.uid, %category, "No records stored");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut delivered = 0u64;
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(&line) {
                Ok(record) => {
                    sink.accept(record);
                    delivered += 1;
                }
                Err(e) => warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping malformed record"
                ),
            }
        }
        debug!(uid = %account.uid, %category, delivered, "Streamed records");
        Ok(())
    }
}

fn write_lines<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for record in records {
        let line =
            serde_json::to_string(record).map_err(|e| DataAccessError::Malformed(e.to_string()))?;
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

fn count_records(path: &Path) -> Result<u64> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        if !line?.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

impl RecordSource for JsonlRecordSource {
    fn visit_metadata(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<MetadataRecord>,
    ) -> Result<()> {
        self.stream(account, RecordCategory::Metadata, sink)
    }

    fn visit_geodocs(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<GeodocRecord>,
    ) -> Result<()> {
        self.stream(account, RecordCategory::Geodocs, sink)
    }

    fn visit_extractor_log(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<ExtractorRecord>,
    ) -> Result<()> {
        self.stream(account, RecordCategory::ExtractorLog, sink)
    }

    fn visit_ogc_stats(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<OgcStatisticsRecord>,
    ) -> Result<()> {
        self.stream(account, RecordCategory::OgcStats, sink)
    }

    /// Counts every stored record, then removes the four record files. The
    /// account profile is kept.
    fn delete_account_data(&self, account: &Account) -> Result<DeletedRecords> {
        let mut deleted = DeletedRecords::new(account.uid.clone());
        for category in RecordCategory::ALL {
            let count = count_records(&self.category_file(&account.uid, category))?;
            deleted.set(category, count);
        }

        for category in RecordCategory::ALL {
            let path = self.category_file(&account.uid, category);
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed record file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!(uid = %account.uid, total = deleted.total(), "Removed stored records");
        Ok(deleted)
    }
}

impl AccountDirectory for JsonlRecordSource {
    fn find_by_uid(&self, uid: &str) -> Result<Account> {
        let path = self.account_dir(uid).join(ACCOUNT_FILE_NAME);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DataAccessError::AccountNotFound(uid.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text)
            .map_err(|e| DataAccessError::Malformed(format!("{}: {}", path.display(), e)))
    }
}
