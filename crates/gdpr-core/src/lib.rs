//! GDPR account data export and erasure.
//!
//! This library provides:
//! - [`ExportCoordinator`]: staging, bundle assembly, packaging and cleanup
//! - [`DeletionCoordinator`]: erasure of an account's activity records
//! - Configuration resolution and logging setup for the CLI
//! - An LDIF profile formatter and a JSONL directory record source
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod deletion;
pub mod error;
pub mod exit_codes;
pub mod export;
pub mod ldif;
pub mod logging;
pub mod staging;
pub mod store;

pub use config::{resolve_config, ConfigSource, ExportConfig, ResolvedConfig};
pub use deletion::{DeletedAccountSummary, DeletionCoordinator};
pub use error::{Error, Result};
pub use export::{dispose_archive, Disposal, ExportCoordinator, ExportHandle};
pub use ldif::LdifFormatter;
pub use staging::StagingDir;
pub use store::JsonlRecordSource;
