//! Account data bundle assembly and archiving.
//!
//! This crate turns the activity records of one account into a single
//! downloadable archive.
//!
//! # Bundle Layout
//!
//! The staging directory populated by [`BundleBuilder`] looks like:
//! ```text
//! account_info.ldif          directory profile of the account
//! data_extractions_log.csv   one row per data extraction job
//! ogc_request_log.csv        one row per OGC service request
//! metadata/
//!   YYYY-MM-DD_<schema>_<id>.xml      one file per metadata record
//! geodocs/
//!   geodocs.csv                       one row per saved document
//!   YYYY-MM-DD_<hash>.<standard>      one file per saved document
//! ```
//!
//! The four record categories are collected concurrently, each by its own
//! producer writing to its own part of the tree. [`archive::pack`] then
//! compresses the tree into a ZIP file next to it.
//!
//! # Example
//!
//! ```no_run
//! use gdpr_bundle::{archive, BundleBuilder};
//! use gdpr_common::{Account, MemoryRecordSource, ProfileFormatter};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct Plain;
//! impl ProfileFormatter for Plain {
//!     fn render(&self, account: &Account) -> gdpr_common::Result<String> {
//!         Ok(format!("uid: {}", account.uid))
//!     }
//! }
//!
//! let builder = BundleBuilder::new(Arc::new(MemoryRecordSource::new()), Arc::new(Plain));
//! let bundle = builder.build(&Account::new("jdoe"), Path::new("/tmp/jdoe-export")).unwrap();
//! let zip = archive::pack(&bundle.folder).unwrap();
//! ```

pub mod archive;
pub mod builder;
pub mod error;
pub mod layout;
pub mod producer;
pub mod reader;

pub use archive::{pack, ARCHIVE_EXTENSION};
pub use builder::{BundleBuilder, BundleStats, UserDataBundle};
pub use error::{BundleError, Result};
pub use producer::{
    ContentProducer, ExtractorProducer, GeodocsProducer, MetadataProducer,
    OgcStatisticsProducer, ProducerReport,
};
pub use reader::{check_archive, ArchiveReader, ArchiveStatus};
