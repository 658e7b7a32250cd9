//! In-memory record source.
//!
//! Holds accounts and their records in a map. Used by tests and by
//! embedders that already have the records at hand.

use crate::records::{
    DeletedRecords, ExtractorRecord, GeodocRecord, MetadataRecord, OgcStatisticsRecord,
    RecordCategory,
};
use crate::source::{AccountDirectory, RecordSink, RecordSource};
use crate::{Account, DataAccessError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// All records held for one account.
#[derive(Debug, Clone, Default)]
pub struct AccountRecords {
    pub metadata: Vec<MetadataRecord>,
    pub geodocs: Vec<GeodocRecord>,
    pub extractor: Vec<ExtractorRecord>,
    pub ogc_stats: Vec<OgcStatisticsRecord>,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    records: HashMap<String, AccountRecords>,
    failing: HashSet<RecordCategory>,
}

/// Thread-safe in-memory [`RecordSource`] and [`AccountDirectory`].
#[derive(Debug, Default)]
pub struct MemoryRecordSource {
    state: Mutex<State>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and its records, replacing previous ones.
    pub fn insert(&self, account: Account, records: AccountRecords) {
        let mut state = self.lock();
        state.records.insert(account.uid.clone(), records);
        state.accounts.insert(account.uid.clone(), account);
    }

    /// Make every visit of `category` fail with [`DataAccessError::Unavailable`].
    pub fn fail_category(&self, category: RecordCategory) {
        self.lock().failing.insert(category);
    }

    /// Records currently held for an account.
    pub fn records(&self, uid: &str) -> Option<AccountRecords> {
        self.lock().records.get(uid).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking sink cannot leave the map half-updated.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot one category's records so the lock is not held while the
    /// sink runs.
    fn snapshot<T: Clone>(
        &self,
        account: &Account,
        category: RecordCategory,
        select: impl Fn(&AccountRecords) -> &Vec<T>,
    ) -> Result<Vec<T>> {
        let state = self.lock();
        if state.failing.contains(&category) {
            return Err(DataAccessError::Unavailable(format!(
                "{} records unavailable for {}",
                category, account.uid
            )));
        }
        Ok(state
            .records
            .get(&account.uid)
            .map(|r| select(r).clone())
            .unwrap_or_default())
    }
}

fn drain<T>(records: Vec<T>, sink: &mut dyn RecordSink<T>) {
    for record in records {
        sink.accept(record);
    }
}

impl RecordSource for MemoryRecordSource {
    fn visit_metadata(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<MetadataRecord>,
    ) -> Result<()> {
        drain(
            self.snapshot(account, RecordCategory::Metadata, |r| &r.metadata)?,
            sink,
        );
        Ok(())
    }

    fn visit_geodocs(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<GeodocRecord>,
    ) -> Result<()> {
        drain(
            self.snapshot(account, RecordCategory::Geodocs, |r| &r.geodocs)?,
            sink,
        );
        Ok(())
    }

    fn visit_extractor_log(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<ExtractorRecord>,
    ) -> Result<()> {
        drain(
            self.snapshot(account, RecordCategory::ExtractorLog, |r| &r.extractor)?,
            sink,
        );
        Ok(())
    }

    fn visit_ogc_stats(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<OgcStatisticsRecord>,
    ) -> Result<()> {
        drain(
            self.snapshot(account, RecordCategory::OgcStats, |r| &r.ogc_stats)?,
            sink,
        );
        Ok(())
    }

    fn delete_account_data(&self, account: &Account) -> Result<DeletedRecords> {
        let mut state = self.lock();
        if let Some(category) = state.failing.iter().next() {
            return Err(DataAccessError::Unavailable(format!(
                "cannot delete {} records for {}",
                category, account.uid
            )));
        }

        let removed = state.records.remove(&account.uid).unwrap_or_default();
        let mut deleted = DeletedRecords::new(account.uid.clone());
        deleted.set(RecordCategory::Metadata, removed.metadata.len() as u64);
        deleted.set(RecordCategory::Geodocs, removed.geodocs.len() as u64);
        deleted.set(RecordCategory::ExtractorLog, removed.extractor.len() as u64);
        deleted.set(RecordCategory::OgcStats, removed.ogc_stats.len() as u64);

        debug!(uid = %account.uid, total = deleted.total(), "Removed in-memory records");
        Ok(deleted)
    }
}

impl AccountDirectory for MemoryRecordSource {
    fn find_by_uid(&self, uid: &str) -> Result<Account> {
        self.lock()
            .accounts
            .get(uid)
            .cloned()
            .ok_or_else(|| DataAccessError::AccountNotFound(uid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn md(id: i64) -> MetadataRecord {
        MetadataRecord {
            id,
            schema_id: "ISO19139".to_string(),
            created_date: NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            document_content: format!("<md id=\"{}\"/>", id),
        }
    }

    fn source_with(ids: &[i64]) -> MemoryRecordSource {
        let source = MemoryRecordSource::new();
        source.insert(
            Account::new("jdoe"),
            AccountRecords {
                metadata: ids.iter().copied().map(md).collect(),
                ..Default::default()
            },
        );
        source
    }

    #[test]
    fn test_visit_streams_all_records() {
        let source = source_with(&[10, 11]);
        let mut sink: Vec<MetadataRecord> = Vec::new();

        source
            .visit_metadata(&Account::new("jdoe"), &mut sink)
            .unwrap();

        assert_eq!(sink.iter().map(|r| r.id).collect::<Vec<_>>(), vec![10, 11]);
    }

    #[test]
    fn test_visit_unknown_account_is_empty() {
        let source = source_with(&[10]);
        let mut sink: Vec<GeodocRecord> = Vec::new();

        source
            .visit_geodocs(&Account::new("nobody"), &mut sink)
            .unwrap();

        assert!(sink.is_empty());
    }

    #[test]
    fn test_failing_category() {
        let source = source_with(&[10]);
        source.fail_category(RecordCategory::Metadata);
        let mut sink: Vec<MetadataRecord> = Vec::new();

        let result = source.visit_metadata(&Account::new("jdoe"), &mut sink);

        assert!(matches!(result, Err(DataAccessError::Unavailable(_))));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_delete_counts_and_removes() {
        let source = source_with(&[1, 2, 3]);
        let account = Account::new("jdoe");

        assert_eq!(source.records("jdoe").unwrap().metadata.len(), 3);
        let deleted = source.delete_account_data(&account).unwrap();
        assert_eq!(deleted.account_id, "jdoe");
        assert_eq!(deleted.metadata_records, 3);
        assert_eq!(deleted.total(), 3);
        assert!(source.records("jdoe").is_none());

        let again = source.delete_account_data(&account).unwrap();
        assert_eq!(again.total(), 0);
    }

    #[test]
    fn test_find_by_uid() {
        let source = source_with(&[]);
        assert_eq!(source.find_by_uid("jdoe").unwrap().uid, "jdoe");
        assert!(matches!(
            source.find_by_uid("ghost"),
            Err(DataAccessError::AccountNotFound(_))
        ));
    }
}
