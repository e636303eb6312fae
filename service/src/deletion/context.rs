use std::sync::Arc;

use async_std::channel::Sender;
use core_types::events::DeletionEvent;
use document_store::DocumentStoreOps;

use crate::{
    activity_log::ActivityLogOps,
    deletion::model::{DeletionPlan, DeletionRequest},
};

pub struct DeletionContext {
    pub request: DeletionRequest,
    pub store: Arc<dyn DocumentStoreOps>,
    pub activity: Arc<dyn ActivityLogOps>,
    pub progress_tx: Option<Sender<DeletionEvent>>,
    /// Built by discovery, consumed by commit.
    pub plan: Option<DeletionPlan>,
    pub dependents_removed: usize,
    pub batches_committed: usize,
}

impl DeletionContext {
    pub fn new(
        request: DeletionRequest,
        store: Arc<dyn DocumentStoreOps>,
        activity: Arc<dyn ActivityLogOps>,
        progress_tx: Option<Sender<DeletionEvent>>,
    ) -> Self {
        Self {
            request,
            store,
            activity,
            progress_tx,
            plan: None,
            dependents_removed: 0,
            batches_committed: 0,
        }
    }

    pub async fn publish(&self, event: DeletionEvent) {
        if let Some(tx) = &self.progress_tx {
            tx.send(event).await.ok();
        }
    }
}
