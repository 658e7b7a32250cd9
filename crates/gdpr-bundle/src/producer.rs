//! Content producers: one sink per record category.
//!
//! Each producer owns its output location exclusively. Metadata records
//! become one file each; the three other categories append one row per
//! record to a CSV log that is opened, and given its header, at
//! construction. Geodocs additionally write one side file per record.
//!
//! A record that cannot be written is logged and counted as skipped; it
//! never aborts the stream.

use crate::layout::{EXTRACTOR_HEADER, GEODOCS_HEADER, GEODOCS_LOG_FILE_NAME, OGC_STATS_HEADER};
use crate::{BundleError, Result};
use gdpr_common::format::{content_datetime, filename_date, sanitize_component, time_of_day};
use gdpr_common::{
    ExtractorRecord, GeodocRecord, MetadataRecord, OgcStatisticsRecord, RecordCategory,
    RecordSink,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Outcome of one producer once closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProducerReport {
    pub category: RecordCategory,
    /// Records fully materialized.
    pub written: u64,
    /// Records that could not be written and were left out.
    pub skipped: u64,
}

impl ProducerReport {
    fn new(category: RecordCategory) -> Self {
        Self {
            category,
            written: 0,
            skipped: 0,
        }
    }
}

/// The owned output of one record category.
///
/// Every producer is also the [`RecordSink`] of its record type. `close`
/// flushes and releases the output; only the first call touches it, later
/// calls return the same report.
pub trait ContentProducer: Send {
    fn category(&self) -> RecordCategory;

    fn close(&mut self) -> Result<ProducerReport>;
}

/// A CSV log file with a fixed header, opened for the producer's lifetime.
#[derive(Debug)]
struct CsvLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl CsvLog {
    fn create(path: &Path, header: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BundleError::setup(parent, e))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| BundleError::setup(path, e))?;

        let mut log = Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
        };
        log.append(header).map_err(|e| BundleError::setup(path, e))?;

        debug!(path = %path.display(), "Opened CSV log");
        Ok(log)
    }

    fn append(&mut self, row: &str) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writeln!(writer, "{}", row),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("log {} already closed", self.path.display()),
            )),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }
}

fn join_roles(roles: &BTreeSet<String>) -> String {
    roles.iter().map(String::as_str).collect::<Vec<_>>().join("|")
}

/// File name of a metadata record: `<date>_<schema>_<id>.xml`.
pub fn metadata_file_name(record: &MetadataRecord) -> String {
    format!(
        "{}_{}_{}.xml",
        filename_date(&record.created_date),
        sanitize_component(&record.schema_id),
        record.id
    )
}

/// File name of a saved document: `<date>_<hash>.<standard>`.
pub fn geodoc_file_name(record: &GeodocRecord) -> String {
    format!(
        "{}_{}.{}",
        filename_date(&record.created_at),
        sanitize_component(&record.file_hash),
        sanitize_component(&record.standard.to_lowercase())
    )
}

pub fn encode_geodoc(record: &GeodocRecord) -> String {
    format!(
        "{},{},{},{},{}",
        content_datetime(&record.created_at),
        content_datetime(&record.last_access),
        record.standard,
        record.access_count,
        record.file_hash
    )
}

pub fn encode_extractor(record: &ExtractorRecord) -> String {
    let resolution = record
        .resolution
        .map(|r| r.to_string())
        .unwrap_or_default();
    let bbox = record
        .bbox
        .as_ref()
        .map(|g| g.to_wkt())
        .unwrap_or_default();

    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{}",
        content_datetime(&record.creation_date),
        time_of_day(&record.duration),
        record.org,
        join_roles(&record.roles),
        record.success,
        record.layer_name,
        record.format,
        record.projection,
        resolution,
        bbox,
        record.ows_type,
        record.ows_url.replace(',', "%2C")
    )
}

pub fn encode_ogc_stats(record: &OgcStatisticsRecord) -> String {
    format!(
        "{},{},{},{},{},{}",
        content_datetime(&record.date),
        record.org,
        join_roles(&record.roles),
        record.layer,
        record.service,
        record.request
    )
}

/// Writes one `.xml` file per metadata record into its directory.
///
/// Holds no open handle: each file is opened, written and closed per record.
#[derive(Debug)]
pub struct MetadataProducer {
    directory: PathBuf,
    report: ProducerReport,
}

impl MetadataProducer {
    /// The directory must already exist.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            report: ProducerReport::new(RecordCategory::Metadata),
        }
    }
}

impl RecordSink<MetadataRecord> for MetadataProducer {
    fn accept(&mut self, record: MetadataRecord) {
        let target = self.directory.join(metadata_file_name(&record));
        match fs::write(&target, record.document_content.as_bytes()) {
            Ok(()) => {
                self.report.written += 1;
                debug!(path = %target.display(), "Wrote metadata document");
            }
            Err(e) => {
                self.report.skipped += 1;
                error!(path = %target.display(), error = %e, "Error writing metadata document");
            }
        }
    }
}

impl ContentProducer for MetadataProducer {
    fn category(&self) -> RecordCategory {
        RecordCategory::Metadata
    }

    fn close(&mut self) -> Result<ProducerReport> {
        Ok(self.report)
    }
}

/// Writes `geodocs.csv` plus one file per saved document into its directory.
#[derive(Debug)]
pub struct GeodocsProducer {
    directory: PathBuf,
    log: CsvLog,
    report: ProducerReport,
}

impl GeodocsProducer {
    /// Create the directory if needed and open `geodocs.csv` in it.
    pub fn create(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        let log = CsvLog::create(&directory.join(GEODOCS_LOG_FILE_NAME), GEODOCS_HEADER)?;
        Ok(Self {
            directory,
            log,
            report: ProducerReport::new(RecordCategory::Geodocs),
        })
    }
}

impl RecordSink<GeodocRecord> for GeodocsProducer {
    fn accept(&mut self, record: GeodocRecord) {
        let doc_file = self.directory.join(geodoc_file_name(&record));
        if let Err(e) = fs::write(&doc_file, record.raw_file_content.as_bytes()) {
            self.report.skipped += 1;
            error!(path = %doc_file.display(), error = %e, "Error writing saved document");
            return;
        }

        match self.log.append(&encode_geodoc(&record)) {
            Ok(()) => self.report.written += 1,
            Err(e) => {
                self.report.skipped += 1;
                warn!(path = %self.log.path.display(), error = %e, "Error appending geodocs row");
                // keep every side file referenced by a row
                let _ = fs::remove_file(&doc_file);
            }
        }
    }
}

impl ContentProducer for GeodocsProducer {
    fn category(&self) -> RecordCategory {
        RecordCategory::Geodocs
    }

    fn close(&mut self) -> Result<ProducerReport> {
        self.log.close()?;
        Ok(self.report)
    }
}

/// Appends one row per extraction job to the extractor log.
#[derive(Debug)]
pub struct ExtractorProducer {
    log: CsvLog,
    report: ProducerReport,
}

impl ExtractorProducer {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            log: CsvLog::create(path, EXTRACTOR_HEADER)?,
            report: ProducerReport::new(RecordCategory::ExtractorLog),
        })
    }
}

impl RecordSink<ExtractorRecord> for ExtractorProducer {
    fn accept(&mut self, record: ExtractorRecord) {
        match self.log.append(&encode_extractor(&record)) {
            Ok(()) => self.report.written += 1,
            Err(e) => {
                self.report.skipped += 1;
                warn!(path = %self.log.path.display(), error = %e, "Error appending extractor row");
            }
        }
    }
}

impl ContentProducer for ExtractorProducer {
    fn category(&self) -> RecordCategory {
        RecordCategory::ExtractorLog
    }

    fn close(&mut self) -> Result<ProducerReport> {
        self.log.close()?;
        Ok(self.report)
    }
}

/// Appends one row per OGC request to the request log.
#[derive(Debug)]
pub struct OgcStatisticsProducer {
    log: CsvLog,
    report: ProducerReport,
}

impl OgcStatisticsProducer {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            log: CsvLog::create(path, OGC_STATS_HEADER)?,
            report: ProducerReport::new(RecordCategory::OgcStats),
        })
    }
}

impl RecordSink<OgcStatisticsRecord> for OgcStatisticsProducer {
    fn accept(&mut self, record: OgcStatisticsRecord) {
        match self.log.append(&encode_ogc_stats(&record)) {
            Ok(()) => self.report.written += 1,
            Err(e) => {
                self.report.skipped += 1;
                warn!(path = %self.log.path.display(), error = %e, "Error appending OGC request row");
            }
        }
    }
}

impl ContentProducer for OgcStatisticsProducer {
    fn category(&self) -> RecordCategory {
        RecordCategory::OgcStats
    }

    fn close(&mut self) -> Result<ProducerReport> {
        self.log.close()?;
        Ok(self.report)
    }
}
