//! Activity record categories and record types.

use crate::geometry::Geometry;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The closed set of activity record streams kept for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    /// Metadata documents contributed by the account.
    Metadata,
    /// Documents saved by the account.
    Geodocs,
    /// Data extraction job log.
    ExtractorLog,
    /// OGC service request log.
    OgcStats,
}

impl RecordCategory {
    /// All categories, in collection order.
    pub const ALL: [RecordCategory; 4] = [
        RecordCategory::Metadata,
        RecordCategory::Geodocs,
        RecordCategory::ExtractorLog,
        RecordCategory::OgcStats,
    ];

    /// Stable short name used in logs and store file names.
    pub fn name(&self) -> &'static str {
        match self {
            RecordCategory::Metadata => "metadata",
            RecordCategory::Geodocs => "geodocs",
            RecordCategory::ExtractorLog => "extractor",
            RecordCategory::OgcStats => "ogcstats",
        }
    }
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for RecordCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metadata" | "md" => Ok(RecordCategory::Metadata),
            "geodocs" | "docs" => Ok(RecordCategory::Geodocs),
            "extractor" | "extractor_log" => Ok(RecordCategory::ExtractorLog),
            "ogcstats" | "ogc_stats" => Ok(RecordCategory::OgcStats),
            _ => Err(format!("unknown record category: {}", s)),
        }
    }
}

/// A metadata document contributed by the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub id: i64,
    pub schema_id: String,
    pub created_date: NaiveDateTime,
    /// Raw document text, exported verbatim.
    pub document_content: String,
}

/// A document saved by the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeodocRecord {
    pub created_at: NaiveDateTime,
    pub last_access: NaiveDateTime,
    /// Format tag, e.g. `SLD` or `KML`. Lower-cased for the file extension.
    pub standard: String,
    pub access_count: u64,
    pub file_hash: String,
    pub raw_file_content: String,
}

/// A data extraction job run by the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorRecord {
    pub creation_date: NaiveDateTime,
    /// Job duration, expressed as a time of day.
    pub duration: NaiveTime,
    pub org: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    pub success: bool,
    pub layer_name: String,
    pub format: String,
    pub projection: String,
    #[serde(default)]
    pub resolution: Option<f64>,
    #[serde(default)]
    pub bbox: Option<Geometry>,
    pub ows_type: String,
    pub ows_url: String,
}

/// An OGC service request issued by the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OgcStatisticsRecord {
    pub date: NaiveDateTime,
    pub org: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    pub layer: String,
    pub service: String,
    pub request: String,
}

/// Per-category counts reported by the store after deleting or obfuscating
/// an account's records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRecords {
    pub account_id: String,
    pub metadata_records: u64,
    pub extractor_records: u64,
    pub geodocs_records: u64,
    pub ogc_stats_records: u64,
}

impl DeletedRecords {
    /// Empty counts for an account.
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Default::default()
        }
    }

    /// Record a count for one category.
    pub fn set(&mut self, category: RecordCategory, count: u64) {
        match category {
            RecordCategory::Metadata => self.metadata_records = count,
            RecordCategory::Geodocs => self.geodocs_records = count,
            RecordCategory::ExtractorLog => self.extractor_records = count,
            RecordCategory::OgcStats => self.ogc_stats_records = count,
        }
    }

    /// Sum across categories.
    pub fn total(&self) -> u64 {
        self.metadata_records + self.extractor_records + self.geodocs_records + self.ogc_stats_records
    }
}
