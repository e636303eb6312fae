use std::sync::Arc;

use async_std::channel::Sender;
use core_types::events::DeletionEvent;
use document_store::DocumentStoreOps;

use crate::{
    activity_log::{ActivityEvent, ActivityLogOps, StoreActivityLog},
    deletion::{
        context::DeletionContext,
        model::{DeleteOutcome, DeletionRequest},
    },
    error::Error,
    pipeline::{cancel::CancelToken, generic_pipeline::Pipeline},
};

/// Removes a root record together with everything that references it.
///
/// Strict two-phase protocol: the full plan is discovered with pure
/// reads before the first delete is enqueued. A `Discovery` error means
/// nothing changed; a `Commit` error means a prefix of the batches went
/// through and the activity log holds what they removed.
pub struct DeletionService {
    store: Arc<dyn DocumentStoreOps>,
    activity: Arc<dyn ActivityLogOps>,
}

impl DeletionService {
    pub fn new(store: Arc<dyn DocumentStoreOps>) -> Self {
        let activity = Arc::new(StoreActivityLog::new(store.clone()));
        Self::new_with_ops(store, activity)
    }

    pub fn new_with_ops(store: Arc<dyn DocumentStoreOps>, activity: Arc<dyn ActivityLogOps>) -> Self {
        Self { store, activity }
    }

    pub async fn plan_and_delete_cascade(
        &self,
        request: DeletionRequest,
        progress_tx: Option<Sender<DeletionEvent>>,
    ) -> Result<DeleteOutcome, Error> {
        tracing::info!("Starting cascading deletion of {}", request.root);
        let root = request.root.clone();

        let mut context = DeletionContext::new(
            request,
            self.store.clone(),
            self.activity.clone(),
            progress_tx,
        );
        let pipeline = Pipeline::<DeletionContext>::new();
        pipeline.execute(&mut context, &CancelToken::new()).await?;

        let outcome = DeleteOutcome {
            dependents_removed: context.dependents_removed,
            batches_committed: context.batches_committed,
        };
        context
            .publish(DeletionEvent::DeletionCompleted {
                dependents_removed: outcome.dependents_removed,
                batches_committed: outcome.batches_committed,
            })
            .await;

        if let Err(e) = self
            .activity
            .log_activity(ActivityEvent::CascadeCompleted {
                root: root.clone(),
                dependents_removed: outcome.dependents_removed,
            })
            .await
        {
            tracing::warn!("Failed to log cascade completion activity: {}", e);
        }

        tracing::info!(
            "Cascading deletion of {} complete: {} dependent(s) removed in {} batch(es)",
            root,
            outcome.dependents_removed,
            outcome.batches_committed
        );
        Ok(outcome)
    }
}
