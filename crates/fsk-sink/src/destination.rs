//! Destination stores for committed batch files.
//!
//! The copy is non-overwriting by contract: atomic visibility at the final
//! location belongs to the host committer, so an already-present destination
//! is an error here, never something to clobber.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use fsk_common::{FskError, Result};

/// Copies a fully formed staged file to its final destination.
pub trait DestinationStore: Send + Sync {
    /// Copies `staged` to `dest`, failing if `dest` already exists.
    /// Returns the number of bytes copied.
    fn copy_from_local(&self, staged: &Path, dest: &str) -> Result<u64>;
}

/// Destination on a locally mounted filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFsDestination;

impl DestinationStore for LocalFsDestination {
    fn copy_from_local(&self, staged: &Path, dest: &str) -> Result<u64> {
        let dest_path = Path::new(dest);
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FskError::Transfer(format!("cannot prepare destination '{dest}': {e}"))
            })?;
        }
        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest_path)
            .map_err(|e| {
                FskError::Transfer(format!("cannot create destination '{dest}': {e}"))
            })?;
        let mut src = File::open(staged)
            .map_err(|e| FskError::Transfer(format!("copy to '{dest}' failed: {e}")))?;
        let bytes = io::copy(&mut src, &mut out)
            .map_err(|e| FskError::Transfer(format!("copy to '{dest}' failed: {e}")))?;
        Ok(bytes)
    }
}

/// Destination behind an object-store URI (S3/GCS/Azure via `object_store`).
#[cfg(feature = "s3")]
pub mod object_store_destination {
    use std::collections::HashMap;
    use std::path::Path;

    use object_store::{ObjectStore, PutMode, PutOptions, PutPayload, parse_url_opts};
    use url::Url;

    use fsk_common::{FskError, Result};

    use super::DestinationStore;

    /// Uploads staged files with create-only semantics, so an existing
    /// destination object fails the transfer instead of being replaced.
    #[derive(Debug, Clone, Default)]
    pub struct ObjectStoreDestination {
        options: HashMap<String, String>,
    }

    impl ObjectStoreDestination {
        #[must_use]
        pub fn new(options: HashMap<String, String>) -> Self {
            Self { options }
        }
    }

    impl DestinationStore for ObjectStoreDestination {
        fn copy_from_local(&self, staged: &Path, dest: &str) -> Result<u64> {
            let url = Url::parse(dest).map_err(|e| {
                FskError::Transfer(format!("invalid destination uri '{dest}': {e}"))
            })?;
            let (store, path) = parse_url_opts(&url, self.options.clone()).map_err(|e| {
                FskError::Transfer(format!("failed to build object store for '{dest}': {e}"))
            })?;

            let payload = bytes::Bytes::from(
                std::fs::read(staged)
                    .map_err(|e| FskError::Transfer(format!("copy to '{dest}' failed: {e}")))?,
            );
            let len = payload.len() as u64;
            let opts = PutOptions {
                mode: PutMode::Create,
                ..Default::default()
            };
            futures::executor::block_on(store.put_opts(&path, PutPayload::from(payload), opts))
                .map_err(|e| match e {
                    object_store::Error::AlreadyExists { .. } => FskError::Transfer(format!(
                        "destination '{dest}' already exists"
                    )),
                    other => {
                        FskError::Transfer(format!("object-store put failed for '{dest}': {other}"))
                    }
                })?;
            Ok(len)
        }
    }
}

#[cfg(feature = "s3")]
pub use object_store_destination::ObjectStoreDestination;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{DestinationStore, LocalFsDestination};

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("{prefix}_{nanos}"))
    }

    #[test]
    fn copies_bytes_and_creates_parent_dirs() {
        let dir = temp_dir("fsk_dest_copy");
        let staged = dir.join("staged.bin");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(&staged, b"payload").expect("write staged");

        let dest = dir.join("nested/out.bin");
        let bytes = LocalFsDestination
            .copy_from_local(&staged, dest.to_str().expect("utf8 path"))
            .expect("copy");
        assert_eq!(bytes, 7);
        assert_eq!(std::fs::read(&dest).expect("read dest"), b"payload");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn existing_destination_fails_and_names_the_path() {
        let dir = temp_dir("fsk_dest_exists");
        let staged = dir.join("staged.bin");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(&staged, b"payload").expect("write staged");

        let dest = dir.join("out.bin");
        std::fs::write(&dest, b"already here").expect("pre-create dest");

        let err = LocalFsDestination
            .copy_from_local(&staged, dest.to_str().expect("utf8 path"))
            .expect_err("existing destination must fail");
        assert!(
            err.to_string().contains(dest.to_str().expect("utf8 path")),
            "error must name the destination, got: {err}"
        );
        assert_eq!(
            std::fs::read(&dest).expect("read dest"),
            b"already here",
            "existing destination must not be clobbered"
        );

        let _ = std::fs::remove_dir_all(dir);
    }
}
