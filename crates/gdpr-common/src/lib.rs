//! Shared types for GDPR account data export and erasure.
//!
//! This crate provides the vocabulary used by the bundle and core crates:
//! - The account identity and its directory attributes
//! - The four activity record categories and their record types
//! - The collaborator interfaces the export pipeline consumes
//!   ([`RecordSource`], [`RecordSink`], [`ProfileFormatter`], [`AccountDirectory`])
//! - Explicit date/time formatting used for file names and log rows
//! - An in-memory record source for tests and embedders

pub mod account;
pub mod error;
pub mod format;
pub mod geometry;
pub mod memory;
pub mod records;
pub mod source;

pub use account::Account;
pub use error::{DataAccessError, Result};
pub use geometry::{Coordinate, Geometry};
pub use memory::{AccountRecords, MemoryRecordSource};
pub use records::{
    DeletedRecords, ExtractorRecord, GeodocRecord, MetadataRecord, OgcStatisticsRecord,
    RecordCategory,
};
pub use source::{AccountDirectory, ProfileFormatter, RecordSink, RecordSource};
