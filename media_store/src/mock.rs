use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_std::channel::Sender;
use async_trait::async_trait;
use core_types::events::TransferEvent;

use crate::{BlobStorageError, ops::BlobTransferOps};

/// Internal state for MockBlobStorage.
///
/// Groups all mutable state into a single struct for simplified locking.
#[derive(Default)]
struct MockState {
    /// Stores uploaded blobs (key -> source path)
    uploaded_blobs: HashMap<String, String>,
    /// Tracks which blobs were deleted
    deleted_blobs: HashSet<String>,
    /// Key substrings that should fail on upload
    fail_upload_matching: HashSet<String>,
    /// Keys that should fail on deletion
    fail_delete_keys: HashSet<String>,
    /// Number of parts to simulate in multipart upload (default: 3)
    simulate_part_count: u32,
    /// Total size reported for simulated uploads
    simulate_total_bytes: u64,
}

/// Mock implementation of BlobTransferOps for testing
///
/// This mock allows you to:
/// - Simulate blob uploads and deletions without a network
/// - Test failure scenarios
/// - Verify what operations were performed
/// - Simulate byte-level progress events
#[derive(Clone)]
pub struct MockBlobStorage {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBlobStorage {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                simulate_part_count: 3,
                simulate_total_bytes: 3 * 1024,
                ..Default::default()
            })),
        }
    }
}

impl MockBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a blob that already exists in storage (for testing)
    pub fn add_blob(&self, key: impl Into<String>) {
        let key = key.into();
        let mut state = self.state.lock().unwrap();
        state.uploaded_blobs.insert(key, String::new());
    }

    /// Make uploads fail for every key containing the given substring.
    /// Upload keys carry generated unique segments, so exact-key matching
    /// is not practical for callers; the file name part is stable.
    pub fn fail_upload_matching(&self, key_part: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.fail_upload_matching.insert(key_part.into());
    }

    /// Make deletion fail for a specific key
    pub fn fail_delete_for(&self, key: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.fail_delete_keys.insert(key.into());
    }

    /// Set how many parts to simulate in multipart upload
    pub fn set_part_count(&self, count: u32) {
        let mut state = self.state.lock().unwrap();
        state.simulate_part_count = count;
    }

    /// Check if a blob was uploaded. Matches on key substring for the same
    /// reason as `fail_upload_matching`.
    pub fn was_uploaded_matching(&self, key_part: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.uploaded_blobs.keys().any(|k| k.contains(key_part))
    }

    /// Check if a blob was deleted
    pub fn was_deleted(&self, key: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.deleted_blobs.contains(key)
    }

    /// Get all uploaded blob keys
    pub fn uploaded_keys(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.uploaded_blobs.keys().cloned().collect()
    }

    /// Get the number of uploaded blobs
    pub fn uploaded_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.uploaded_blobs.len()
    }
}

#[async_trait]
impl BlobTransferOps for MockBlobStorage {
    async fn upload_blob(
        &self,
        file_path: &Path,
        key: &str,
        progress_tx: Option<&Sender<TransferEvent>>,
    ) -> Result<String, BlobStorageError> {
        // Check if we should fail this upload
        let should_fail = {
            let state = self.state.lock().unwrap();
            state
                .fail_upload_matching
                .iter()
                .any(|part| key.contains(part))
        };

        if should_fail {
            if let Some(tx) = progress_tx {
                tx.send(TransferEvent::PartUploadFailed {
                    key: key.to_string(),
                    error: "Mock upload failure".to_string(),
                })
                .await
                .ok();
            }

            return Err(BlobStorageError::Other(format!(
                "Mock upload failure for key: {}",
                key
            )));
        }

        // Simulate multipart upload progress
        let (part_count, total_bytes) = {
            let state = self.state.lock().unwrap();
            (state.simulate_part_count, state.simulate_total_bytes)
        };

        if let Some(tx) = progress_tx {
            tx.send(TransferEvent::Started {
                key: key.to_string(),
                total_bytes,
            })
            .await
            .ok();
            let part_bytes = total_bytes / u64::from(part_count.max(1));
            for part in 1..=part_count {
                tx.send(TransferEvent::PartUploaded {
                    key: key.to_string(),
                    part,
                    bytes_sent: part_bytes * u64::from(part),
                    total_bytes,
                })
                .await
                .ok();
            }
        }

        let url = format!("mock://blobs/{}", key);

        {
            let mut state = self.state.lock().unwrap();
            state
                .uploaded_blobs
                .insert(key.to_string(), file_path.display().to_string());
        }

        if let Some(tx) = progress_tx {
            tx.send(TransferEvent::Completed {
                key: key.to_string(),
                url: url.clone(),
            })
            .await
            .ok();
        }

        Ok(url)
    }

    async fn delete_blob(&self, key: &str) -> Result<(), BlobStorageError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_delete_keys.contains(key) {
            return Err(BlobStorageError::Other(format!(
                "Mock deletion failure for key: {}",
                key
            )));
        }

        state.deleted_blobs.insert(key.to_string());
        state.uploaded_blobs.remove(key);

        Ok(())
    }

    async fn blob_exists(&self, key: &str) -> Result<bool, BlobStorageError> {
        let state = self.state.lock().unwrap();
        let is_uploaded = state.uploaded_blobs.contains_key(key);
        let is_deleted = state.deleted_blobs.contains(key);

        Ok(is_uploaded && !is_deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_std::test]
    async fn test_mock_upload() {
        let mock = MockBlobStorage::new();

        let url = mock
            .upload_blob(Path::new("/test/clip.mp4"), "video/abc/clip.mp4", None)
            .await
            .unwrap();

        assert_eq!(url, "mock://blobs/video/abc/clip.mp4");
        assert!(mock.was_uploaded_matching("clip.mp4"));
        assert_eq!(mock.uploaded_count(), 1);
    }

    #[async_std::test]
    async fn test_mock_upload_failure() {
        let mock = MockBlobStorage::new();
        mock.fail_upload_matching("clip.mp4");

        let result = mock
            .upload_blob(Path::new("/test/clip.mp4"), "video/abc/clip.mp4", None)
            .await;

        assert!(result.is_err());
        assert!(!mock.was_uploaded_matching("clip.mp4"));
    }

    #[async_std::test]
    async fn test_mock_delete() {
        let mock = MockBlobStorage::new();
        mock.add_blob("video/abc/clip.mp4");

        mock.delete_blob("video/abc/clip.mp4").await.unwrap();

        assert!(mock.was_deleted("video/abc/clip.mp4"));
        assert!(!mock.blob_exists("video/abc/clip.mp4").await.unwrap());
    }

    #[async_std::test]
    async fn test_upload_with_progress_events() {
        let mock = MockBlobStorage::new();
        mock.set_part_count(5);

        let (tx, rx) = async_std::channel::unbounded();

        mock.upload_blob(Path::new("/test/clip.mp4"), "video/abc/clip.mp4", Some(&tx))
            .await
            .unwrap();

        let mut part_count = 0;
        let mut completed = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                TransferEvent::PartUploaded { .. } => part_count += 1,
                TransferEvent::Completed { url, .. } => {
                    completed = true;
                    assert_eq!(url, "mock://blobs/video/abc/clip.mp4");
                }
                _ => {}
            }
        }

        assert_eq!(part_count, 5);
        assert!(completed);
    }
}
