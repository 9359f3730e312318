pub mod s3_service;

use async_trait::async_trait;

pub use s3_service::S3BlobStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage configuration: {0}")]
    Config(String),
    #[error("download of blob `{path}` failed: {message}")]
    Download { path: String, message: String },
    #[error("upload of blob `{path}` failed: {message}")]
    Upload { path: String, message: String },
}

/// Object storage scoped to a single container.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Stores `data` at `path` and returns the public URL of the blob.
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<String, StorageError>;
}
