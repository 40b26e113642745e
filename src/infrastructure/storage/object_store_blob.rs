use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{BlobStore, BlobStoreError};

/// Blob store backed by any `object_store` implementation: the local
/// filesystem in deployments, an in-memory store for tests and demos.
pub struct ObjectStoreBlobStore {
    inner: Arc<dyn ObjectStore>,
}

impl ObjectStoreBlobStore {
    pub fn local(root: PathBuf) -> Result<Self, BlobStoreError> {
        std::fs::create_dir_all(&root)
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;
        let fs = LocalFileSystem::new_with_prefix(root)
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBlobStore {
    async fn put(&self, path: &str, data: Vec<u8>) -> Result<(), BlobStoreError> {
        self.inner
            .put(&StorePath::from(path), PutPayload::from(data))
            .await
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;
        Ok(())
    }

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, BlobStoreError> {
        let result = self
            .inner
            .get(&StorePath::from(path))
            .await
            .map_err(|e| BlobStoreError::NotFound(e.to_string()))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| BlobStoreError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
