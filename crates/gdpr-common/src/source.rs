//! Collaborator interfaces consumed by the export pipeline.
//!
//! The record store, the account directory and the profile renderer live
//! outside this workspace. The pipeline only sees these traits.

use crate::records::{
    DeletedRecords, ExtractorRecord, GeodocRecord, MetadataRecord, OgcStatisticsRecord,
};
use crate::{Account, Result};

/// Consumer of a stream of records, fed one record at a time.
///
/// Sinks never fail per record: a sink that cannot materialize a record
/// logs it and moves on.
pub trait RecordSink<R> {
    fn accept(&mut self, record: R);
}

impl<R> RecordSink<R> for Vec<R> {
    fn accept(&mut self, record: R) {
        self.push(record);
    }
}

/// Backing store of an account's activity records.
///
/// Each `visit_*` call pushes every record of its category to the sink and
/// returns once the stream is exhausted. Calls for different categories may
/// run concurrently on separate threads.
pub trait RecordSource: Send + Sync {
    fn visit_metadata(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<MetadataRecord>,
    ) -> Result<()>;

    fn visit_geodocs(&self, account: &Account, sink: &mut dyn RecordSink<GeodocRecord>)
        -> Result<()>;

    fn visit_extractor_log(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<ExtractorRecord>,
    ) -> Result<()>;

    fn visit_ogc_stats(
        &self,
        account: &Account,
        sink: &mut dyn RecordSink<OgcStatisticsRecord>,
    ) -> Result<()>;

    /// Delete or obfuscate every record tied to the account.
    ///
    /// All-or-nothing at the store: either the counts of affected records
    /// are returned or nothing was changed.
    fn delete_account_data(&self, account: &Account) -> Result<DeletedRecords>;
}

/// Renders an account's directory profile as portable text.
pub trait ProfileFormatter: Send + Sync {
    fn render(&self, account: &Account) -> Result<String>;
}

/// Resolves account identities to full accounts.
pub trait AccountDirectory: Send + Sync {
    fn find_by_uid(&self, uid: &str) -> Result<Account>;
}
