use std::sync::Arc;

use async_trait::async_trait;
use core_types::RecordId;
use document_store::{DocumentStoreOps, RecordData, RecordRef, StoreError};

pub const ACTIVITY_COLLECTION: &str = "activity";

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    AssetUploaded {
        record_id: RecordId,
        title: String,
    },
    UploadRunCompleted {
        completed: usize,
        failed: usize,
    },
    /// One committed deletion batch. Carries the removed references so a
    /// partially-committed cascade can be reconciled from the log.
    CascadeBatchCommitted {
        root: RecordRef,
        batch_number: usize,
        deleted: Vec<RecordRef>,
    },
    CascadeCompleted {
        root: RecordRef,
        dependents_removed: usize,
    },
}

impl ActivityEvent {
    fn kind(&self) -> &'static str {
        match self {
            ActivityEvent::AssetUploaded { .. } => "asset_uploaded",
            ActivityEvent::UploadRunCompleted { .. } => "upload_run_completed",
            ActivityEvent::CascadeBatchCommitted { .. } => "cascade_batch_committed",
            ActivityEvent::CascadeCompleted { .. } => "cascade_completed",
        }
    }
}

/// Trait for activity logging to enable testing.
///
/// Logging is strictly fire-and-forget: call sites log a warning on
/// failure and never propagate it into the operation's own result.
#[async_trait]
pub trait ActivityLogOps: Send + Sync {
    async fn log_activity(&self, event: ActivityEvent) -> Result<(), StoreError>;
}

/// Writes activity events as records in the document store.
pub struct StoreActivityLog {
    store: Arc<dyn DocumentStoreOps>,
}

impl StoreActivityLog {
    pub fn new(store: Arc<dyn DocumentStoreOps>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ActivityLogOps for StoreActivityLog {
    async fn log_activity(&self, event: ActivityEvent) -> Result<(), StoreError> {
        let mut data = RecordData::new();
        data.insert("kind".to_string(), serde_json::json!(event.kind()));
        match &event {
            ActivityEvent::AssetUploaded { record_id, title } => {
                data.insert("record_id".to_string(), serde_json::json!(record_id));
                data.insert("title".to_string(), serde_json::json!(title));
            }
            ActivityEvent::UploadRunCompleted { completed, failed } => {
                data.insert("completed".to_string(), serde_json::json!(completed));
                data.insert("failed".to_string(), serde_json::json!(failed));
            }
            ActivityEvent::CascadeBatchCommitted {
                root,
                batch_number,
                deleted,
            } => {
                data.insert("root".to_string(), serde_json::json!(root.to_string()));
                data.insert("batch_number".to_string(), serde_json::json!(batch_number));
                let deleted: Vec<String> = deleted.iter().map(RecordRef::to_string).collect();
                data.insert("deleted".to_string(), serde_json::json!(deleted));
            }
            ActivityEvent::CascadeCompleted {
                root,
                dependents_removed,
            } => {
                data.insert("root".to_string(), serde_json::json!(root.to_string()));
                data.insert(
                    "dependents_removed".to_string(),
                    serde_json::json!(dependents_removed),
                );
            }
        }
        self.store.create_record(ACTIVITY_COLLECTION, data).await?;
        Ok(())
    }
}

pub mod mock {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use document_store::StoreError;

    use super::{ActivityEvent, ActivityLogOps};

    #[derive(Default)]
    struct MockState {
        events: Vec<ActivityEvent>,
        fail_all: bool,
    }

    /// Mock implementation of ActivityLogOps for testing
    #[derive(Clone, Default)]
    pub struct MockActivityLog {
        state: Arc<Mutex<MockState>>,
    }

    impl MockActivityLog {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every log call fail; operations must still succeed.
        pub fn fail_all(&self) {
            let mut state = self.state.lock().unwrap();
            state.fail_all = true;
        }

        pub fn events(&self) -> Vec<ActivityEvent> {
            let state = self.state.lock().unwrap();
            state.events.clone()
        }

        pub fn event_count(&self) -> usize {
            let state = self.state.lock().unwrap();
            state.events.len()
        }
    }

    #[async_trait]
    impl ActivityLogOps for MockActivityLog {
        async fn log_activity(&self, event: ActivityEvent) -> Result<(), StoreError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_all {
                return Err(StoreError::Write("Mock activity log failure".to_string()));
            }
            state.events.push(event);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use document_store::mock::MockDocumentStore;

    use super::*;

    #[async_std::test]
    async fn test_store_activity_log_writes_a_record() {
        let store = Arc::new(MockDocumentStore::new());
        let log = StoreActivityLog::new(store.clone());

        log.log_activity(ActivityEvent::UploadRunCompleted {
            completed: 2,
            failed: 1,
        })
        .await
        .unwrap();

        assert_eq!(store.record_count(ACTIVITY_COLLECTION), 1);
    }
}
