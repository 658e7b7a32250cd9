//! Per-export staging directories.

use gdpr_bundle::BundleError;
use gdpr_common::format::sanitize_component;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A freshly created, uniquely named directory that is removed with
/// everything in it when the guard is dropped.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Create `<root>/<uid>-<random>`.
    ///
    /// The root is created if missing. The staging directory itself must
    /// not exist yet, so two exports never share one.
    pub fn create(root: &Path, uid: &str) -> Result<Self, BundleError> {
        fs::create_dir_all(root).map_err(|e| BundleError::setup(root, e))?;

        let name = format!("{}-{}", sanitize_component(uid), Uuid::new_v4().simple());
        let path = root.join(name);
        fs::create_dir(&path).map_err(|e| BundleError::setup(&path, e))?;

        debug!(path = %path.display(), "Created staging directory");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staging directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staging directory")
            }
        }
    }
}
