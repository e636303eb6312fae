use std::path::Path;

use async_std::channel::Sender;
use async_trait::async_trait;
use core_types::events::TransferEvent;

use crate::BlobStorageError;

/// Trait for blob transfer operations to enable testing
#[async_trait]
pub trait BlobTransferOps: Send + Sync {
    /// Upload a file to blob storage and return its public URL.
    ///
    /// The implementation handles multipart upload logic internally.
    /// Progress events are sent through the optional progress_tx channel.
    async fn upload_blob(
        &self,
        file_path: &Path,
        key: &str,
        progress_tx: Option<&Sender<TransferEvent>>,
    ) -> Result<String, BlobStorageError>;

    /// Delete a blob from storage
    async fn delete_blob(&self, key: &str) -> Result<(), BlobStorageError>;

    /// Check if a blob exists in storage
    async fn blob_exists(&self, key: &str) -> Result<bool, BlobStorageError>;
}
