use async_trait::async_trait;

/// Durable store for raw uploaded file bytes, keyed by storage path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, path: &str, data: Vec<u8>) -> Result<(), BlobStoreError>;

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
}
