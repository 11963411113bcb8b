// Attachment bytes live on the filesystem, one directory per tenant;
// only metadata lives in SQLite.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{EngineError, Result};
use crate::store::TenantStore;

pub trait BlobStore {
    /// Store the bytes for a file id, returning the stored size.
    fn put(&self, file_id: i64, bytes: &[u8]) -> Result<u64>;
    fn get(&self, file_id: i64) -> Result<Vec<u8>>;
}

/// Filesystem blob store rooted at a tenant's blob directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn for_tenant(store: &TenantStore) -> Self {
        Self::new(store.blob_dir())
    }

    fn path_for(&self, file_id: i64) -> PathBuf {
        self.root.join(file_id.to_string())
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, file_id: i64, bytes: &[u8]) -> Result<u64> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(file_id), bytes)?;
        Ok(bytes.len() as u64)
    }

    fn get(&self, file_id: i64) -> Result<Vec<u8>> {
        match fs::read(self.path_for(file_id)) {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Err(EngineError::FileNotFound(file_id))
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{BlobStore, FsBlobStore};
    use crate::error::EngineError;

    #[test]
    fn put_then_get_round_trips() {
        let dir = TempDir::new().expect("temp dir should create");
        let blobs = FsBlobStore::new(dir.path().join("blobs"));

        let size = blobs.put(7, b"payload bytes").expect("put should succeed");
        assert_eq!(size, 13);
        assert_eq!(blobs.get(7).expect("get should succeed"), b"payload bytes");
    }

    #[test]
    fn missing_blob_is_a_file_not_found() {
        let dir = TempDir::new().expect("temp dir should create");
        let blobs = FsBlobStore::new(dir.path().join("blobs"));

        let error = blobs.get(404).expect_err("get should fail");
        assert!(matches!(error, EngineError::FileNotFound(404)));
    }
}
