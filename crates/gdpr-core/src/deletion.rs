//! Erasure of an account's activity records.

use gdpr_common::{Account, AccountDirectory, DeletedRecords, RecordSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Result of a deletion: how many records of each category were deleted
/// or obfuscated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedAccountSummary {
    pub account_id: String,
    pub metadata_record_count: u64,
    pub extractor_record_count: u64,
    pub geodocs_record_count: u64,
    pub ogc_stats_record_count: u64,
}

impl From<DeletedRecords> for DeletedAccountSummary {
    fn from(records: DeletedRecords) -> Self {
        Self {
            account_id: records.account_id,
            metadata_record_count: records.metadata_records,
            extractor_record_count: records.extractor_records,
            geodocs_record_count: records.geodocs_records,
            ogc_stats_record_count: records.ogc_stats_records,
        }
    }
}

pub struct DeletionCoordinator {
    source: Arc<dyn RecordSource>,
}

impl DeletionCoordinator {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    /// Delete every record tied to `account`.
    ///
    /// Store errors are returned as-is; the store guarantees nothing was
    /// changed in that case.
    pub fn delete(&self, account: &Account) -> gdpr_common::Result<DeletedAccountSummary> {
        info!(uid = %account.uid, "Deleting account data");
        let deleted = self.source.delete_account_data(account).map_err(|e| {
            error!(uid = %account.uid, error = %e, "Account data deletion failed");
            e
        })?;

        let summary = DeletedAccountSummary::from(deleted);
        info!(
            uid = %summary.account_id,
            metadata = summary.metadata_record_count,
            extractor = summary.extractor_record_count,
            geodocs = summary.geodocs_record_count,
            ogcstats = summary.ogc_stats_record_count,
            "Account data deleted"
        );
        Ok(summary)
    }

    pub fn delete_uid(
        &self,
        directory: &dyn AccountDirectory,
        uid: &str,
    ) -> gdpr_common::Result<DeletedAccountSummary> {
        let account = directory.find_by_uid(uid)?;
        self.delete(&account)
    }
}
