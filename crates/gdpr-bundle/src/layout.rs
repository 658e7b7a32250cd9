//! Fixed names inside a bundle.

/// Account profile at the bundle root.
pub const PROFILE_FILE_NAME: &str = "account_info.ldif";

/// Extraction job log at the bundle root.
pub const EXTRACTOR_LOG_FILE_NAME: &str = "data_extractions_log.csv";

/// OGC request log at the bundle root.
pub const OGC_STATS_LOG_FILE_NAME: &str = "ogc_request_log.csv";

/// Directory holding one file per metadata record.
pub const METADATA_DIR_NAME: &str = "metadata";

/// Directory holding saved documents and their log.
pub const GEODOCS_DIR_NAME: &str = "geodocs";

/// Saved document log inside [`GEODOCS_DIR_NAME`].
pub const GEODOCS_LOG_FILE_NAME: &str = "geodocs.csv";

pub const GEODOCS_HEADER: &str = "created_at,last_access,standard,access_count,file_hash";

pub const EXTRACTOR_HEADER: &str = "creation_date,duration,organization,roles,success,layer_name,format,projection,resolution,bounding_box,OWS_type,URL";

pub const OGC_STATS_HEADER: &str = "date,organization,roles,layer,service,request";
