//! Concurrent assembly of an account's uncompressed data bundle.

use crate::layout::{
    EXTRACTOR_LOG_FILE_NAME, GEODOCS_DIR_NAME, METADATA_DIR_NAME, OGC_STATS_LOG_FILE_NAME,
    PROFILE_FILE_NAME,
};
use crate::producer::{
    ContentProducer, ExtractorProducer, GeodocsProducer, MetadataProducer, OgcStatisticsProducer,
    ProducerReport,
};
use crate::{BundleError, Result};
use gdpr_common::{Account, DataAccessError, ProfileFormatter, RecordCategory, RecordSource};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

/// Per-category producer outcomes of one bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BundleStats {
    pub categories: BTreeMap<RecordCategory, ProducerReport>,
}

impl BundleStats {
    pub fn written(&self, category: RecordCategory) -> u64 {
        self.categories.get(&category).map_or(0, |r| r.written)
    }

    pub fn skipped(&self, category: RecordCategory) -> u64 {
        self.categories.get(&category).map_or(0, |r| r.skipped)
    }

    pub fn total_written(&self) -> u64 {
        self.categories.values().map(|r| r.written).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.categories.values().map(|r| r.skipped).sum()
    }
}

/// A populated, uncompressed staging tree.
#[derive(Debug, Clone)]
pub struct UserDataBundle {
    pub folder: PathBuf,
    pub profile_file: PathBuf,
    pub metadata_directory: PathBuf,
    pub geodocs_directory: PathBuf,
    pub extractor_csv_file: PathBuf,
    pub ogcstats_csv_file: PathBuf,
    pub stats: BundleStats,
}

/// Fans the four record categories out to their producers and waits for
/// all of them.
pub struct BundleBuilder {
    source: Arc<dyn RecordSource>,
    formatter: Arc<dyn ProfileFormatter>,
}

type TaskOutcome = thread::Result<std::result::Result<(), DataAccessError>>;

impl BundleBuilder {
    pub fn new(source: Arc<dyn RecordSource>, formatter: Arc<dyn ProfileFormatter>) -> Self {
        Self { source, formatter }
    }

    /// Populate `folder`, which must exist and be empty, with the account's
    /// data.
    ///
    /// Fails before any collection starts if the profile cannot be rendered
    /// or an output location cannot be created. Once collection has started,
    /// every category runs to completion and every producer is closed; the
    /// first failing category is then reported.
    pub fn build(&self, account: &Account, folder: &Path) -> Result<UserDataBundle> {
        info!(uid = %account.uid, folder = %folder.display(), "Creating data bundle");

        let profile = self.formatter.render(account).map_err(BundleError::Profile)?;
        let profile_file = folder.join(PROFILE_FILE_NAME);
        fs::write(&profile_file, profile).map_err(|e| BundleError::setup(&profile_file, e))?;

        let metadata_directory = folder.join(METADATA_DIR_NAME);
        let geodocs_directory = folder.join(GEODOCS_DIR_NAME);
        let extractor_csv_file = folder.join(EXTRACTOR_LOG_FILE_NAME);
        let ogcstats_csv_file = folder.join(OGC_STATS_LOG_FILE_NAME);

        fs::create_dir(&metadata_directory)
            .map_err(|e| BundleError::setup(&metadata_directory, e))?;

        let mut metadata = MetadataProducer::new(&metadata_directory);
        let mut geodocs = GeodocsProducer::create(&geodocs_directory)?;
        let mut extractor = ExtractorProducer::create(&extractor_csv_file)?;
        let mut ogc_stats = OgcStatisticsProducer::create(&ogcstats_csv_file)?;

        let source = self.source.as_ref();
        let outcomes: [(RecordCategory, TaskOutcome); 4] = thread::scope(|s| {
            let md = s.spawn(|| source.visit_metadata(account, &mut metadata));
            let docs = s.spawn(|| source.visit_geodocs(account, &mut geodocs));
            let jobs = s.spawn(|| source.visit_extractor_log(account, &mut extractor));
            let stats = s.spawn(|| source.visit_ogc_stats(account, &mut ogc_stats));

            [
                (RecordCategory::Metadata, md.join()),
                (RecordCategory::Geodocs, docs.join()),
                (RecordCategory::ExtractorLog, jobs.join()),
                (RecordCategory::OgcStats, stats.join()),
            ]
        });

        // Close in reverse order of creation; every close runs even if an
        // earlier one failed.
        let closed = [
            close_producer(&mut ogc_stats),
            close_producer(&mut extractor),
            close_producer(&mut geodocs),
            close_producer(&mut metadata),
        ];

        let mut failure = None;
        for (category, outcome) in outcomes {
            let err = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(source)) => {
                    error!(uid = %account.uid, %category, error = %source, "Record collection failed");
                    BundleError::Collection { category, source }
                }
                Err(_) => {
                    error!(uid = %account.uid, %category, "Record collection task panicked");
                    BundleError::TaskPanicked(category)
                }
            };
            if failure.is_none() {
                failure = Some(err);
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        let mut stats = BundleStats::default();
        for report in closed {
            let report = report?;
            stats.categories.insert(report.category, report);
        }

        info!(
            uid = %account.uid,
            written = stats.total_written(),
            skipped = stats.total_skipped(),
            "Data bundle populated"
        );

        Ok(UserDataBundle {
            folder: folder.to_path_buf(),
            profile_file,
            metadata_directory,
            geodocs_directory,
            extractor_csv_file,
            ogcstats_csv_file,
            stats,
        })
    }
}

fn close_producer(producer: &mut dyn ContentProducer) -> Result<ProducerReport> {
    let category = producer.category();
    producer.close().map_err(|e| {
        error!(%category, error = %e, "Failed to close producer");
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{EXTRACTOR_HEADER, GEODOCS_HEADER, OGC_STATS_HEADER};
    use chrono::NaiveDate;
    use gdpr_common::memory::AccountRecords;
    use gdpr_common::{
        DeletedRecords, ExtractorRecord, GeodocRecord, MemoryRecordSource, MetadataRecord,
        OgcStatisticsRecord, RecordSink,
    };
    use tempfile::TempDir;

    struct UidFormatter;

    impl ProfileFormatter for UidFormatter {
        fn render(&self, account: &Account) -> gdpr_common::Result<String> {
            Ok(format!("dn: uid={}\n", account.uid))
        }
    }

    struct BrokenFormatter;

    impl ProfileFormatter for BrokenFormatter {
        fn render(&self, account: &Account) -> gdpr_common::Result<String> {
            Err(DataAccessError::AccountNotFound(account.uid.clone()))
        }
    }

    /// Delegates to an in-memory source, except that reading the extractor
    /// log panics.
    struct PanickingExtractorLog(MemoryRecordSource);

    impl RecordSource for PanickingExtractorLog {
        fn visit_metadata(
            &self,
            account: &Account,
            sink: &mut dyn RecordSink<MetadataRecord>,
        ) -> gdpr_common::Result<()> {
            self.0.visit_metadata(account, sink)
        }

        fn visit_geodocs(
            &self,
            account: &Account,
            sink: &mut dyn RecordSink<GeodocRecord>,
        ) -> gdpr_common::Result<()> {
            self.0.visit_geodocs(account, sink)
        }

        fn visit_extractor_log(
            &self,
            _account: &Account,
            _sink: &mut dyn RecordSink<ExtractorRecord>,
        ) -> gdpr_common::Result<()> {
            panic!("extractor log cursor poisoned");
        }

        fn visit_ogc_stats(
            &self,
            account: &Account,
            sink: &mut dyn RecordSink<OgcStatisticsRecord>,
        ) -> gdpr_common::Result<()> {
            self.0.visit_ogc_stats(account, sink)
        }

        fn delete_account_data(&self, account: &Account) -> gdpr_common::Result<DeletedRecords> {
            self.0.delete_account_data(account)
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn source_with_metadata(count: i64) -> MemoryRecordSource {
        let source = MemoryRecordSource::new();
        let metadata = (0..count)
            .map(|id| MetadataRecord {
                id,
                schema_id: "ISO19139".to_string(),
                created_date: NaiveDate::from_ymd_opt(2024, 1, 5)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap(),
                document_content: format!("<md>{}</md>", id),
            })
            .collect();
        source.insert(
            Account::new("jdoe"),
            AccountRecords {
                metadata,
                ..Default::default()
            },
        );
        source
    }

    #[test]
    fn test_build_creates_layout() {
        let dir = TempDir::new().unwrap();
        let builder = BundleBuilder::new(Arc::new(source_with_metadata(3)), Arc::new(UidFormatter));

        let bundle = builder.build(&Account::new("jdoe"), dir.path()).unwrap();

        assert!(bundle.profile_file.is_file());
        assert!(bundle.metadata_directory.is_dir());
        assert!(bundle.geodocs_directory.join("geodocs.csv").is_file());
        assert!(bundle.extractor_csv_file.is_file());
        assert!(bundle.ogcstats_csv_file.is_file());
        assert_eq!(fs::read_dir(&bundle.metadata_directory).unwrap().count(), 3);
        assert_eq!(bundle.stats.written(RecordCategory::Metadata), 3);
        assert_eq!(bundle.stats.categories.len(), 4);
    }

    #[test]
    fn test_build_profile_failure_is_setup_error() {
        let dir = TempDir::new().unwrap();
        let builder =
            BundleBuilder::new(Arc::new(MemoryRecordSource::new()), Arc::new(BrokenFormatter));

        let result = builder.build(&Account::new("jdoe"), dir.path());

        assert!(matches!(result, Err(BundleError::Profile(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_build_collection_failure_after_siblings_finish() {
        let dir = TempDir::new().unwrap();
        let source = source_with_metadata(2);
        source.fail_category(RecordCategory::Geodocs);
        let builder = BundleBuilder::new(Arc::new(source), Arc::new(UidFormatter));

        let result = builder.build(&Account::new("jdoe"), dir.path());

        match result {
            Err(BundleError::Collection { category, .. }) => {
                assert_eq!(category, RecordCategory::Geodocs)
            }
            other => panic!("expected collection error, got {:?}", other),
        }
        // the metadata sibling still ran to completion
        assert_eq!(fs::read_dir(dir.path().join("metadata")).unwrap().count(), 2);
    }

    #[test]
    fn test_panicking_task_still_closes_every_producer() {
        let dir = TempDir::new().unwrap();
        let source = PanickingExtractorLog(source_with_metadata(2));
        let builder = BundleBuilder::new(Arc::new(source), Arc::new(UidFormatter));

        let result = builder.build(&Account::new("jdoe"), dir.path());

        match result {
            Err(BundleError::TaskPanicked(category)) => {
                assert_eq!(category, RecordCategory::ExtractorLog)
            }
            other => panic!("expected a panicked task, got {:?}", other),
        }
        assert_eq!(
            lines(&dir.path().join(EXTRACTOR_LOG_FILE_NAME)),
            vec![EXTRACTOR_HEADER]
        );
        assert_eq!(
            lines(&dir.path().join(OGC_STATS_LOG_FILE_NAME)),
            vec![OGC_STATS_HEADER]
        );
        assert_eq!(
            lines(&dir.path().join(GEODOCS_DIR_NAME).join("geodocs.csv")),
            vec![GEODOCS_HEADER]
        );
        assert_eq!(fs::read_dir(dir.path().join("metadata")).unwrap().count(), 2);
    }
}
