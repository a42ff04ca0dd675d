use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use fsk_common::Result;

// Process-local tiebreaker so two calls within the same clock reading still
// get distinct names.
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Uniquely named local staging file, scoped to one batch-write call.
///
/// The file is claimed on creation and removed on drop, so every exit path
/// of the owning call (success, encode failure, transfer failure) leaves no
/// local disk bytes behind.
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
}

impl StagingFile {
    /// Creates an empty, uniquely named file under `dir` (creating `dir`
    /// first if needed).
    pub fn create(dir: &Path, stem: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("{stem}-{nanos}-{seq}.staging"));
        File::create(&path)?;
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
