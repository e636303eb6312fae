use std::sync::Arc;

use async_std::channel::Sender;
use core_types::{RecordId, events::UploadEvent};
use document_store::DocumentStoreOps;
use media_metadata::{MediaMetadataOps, StdMediaMetadataOps};
use media_store::BlobTransferOps;

use crate::{
    activity_log::{ActivityEvent, ActivityLogOps, StoreActivityLog},
    error::Error,
    pipeline::{cancel::CancelToken, generic_pipeline::Pipeline},
    staging::validate::validate_draft,
    upload::{
        context::{UploadRunContext, UploadRunInput, UploadRunOps},
        model::{ASSET_COLLECTION, CompletedItem, ItemFailure, ItemStage, RunResult, UploadBatch},
    },
};

/// Drives a batch of staged items through the upload stage sequence.
///
/// Items are processed strictly sequentially; one failing item is
/// recorded and the run moves on to the next. The run ends when every
/// item is terminal, and always yields a run-level summary.
pub struct UploadService {
    blob_ops: Arc<dyn BlobTransferOps>,
    metadata_ops: Arc<dyn MediaMetadataOps>,
    store: Arc<dyn DocumentStoreOps>,
    activity: Arc<dyn ActivityLogOps>,
}

impl UploadService {
    pub fn new(blob_ops: Arc<dyn BlobTransferOps>, store: Arc<dyn DocumentStoreOps>) -> Self {
        let activity = Arc::new(StoreActivityLog::new(store.clone()));
        Self::new_with_ops(blob_ops, Arc::new(StdMediaMetadataOps), store, activity)
    }

    pub fn new_with_ops(
        blob_ops: Arc<dyn BlobTransferOps>,
        metadata_ops: Arc<dyn MediaMetadataOps>,
        store: Arc<dyn DocumentStoreOps>,
        activity: Arc<dyn ActivityLogOps>,
    ) -> Self {
        Self {
            blob_ops,
            metadata_ops,
            store,
            activity,
        }
    }

    /// Validate every draft, then run the batch to completion.
    ///
    /// Validation failure returns before any external call. An empty
    /// batch returns an empty result, also without external calls.
    pub async fn validate_and_run(
        &self,
        batch: UploadBatch,
        progress_tx: Option<Sender<UploadEvent>>,
        cancel: &CancelToken,
    ) -> Result<RunResult, Error> {
        let issues: Vec<_> = batch
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| (index, validate_draft(&item.draft)))
            .filter(|(_, issues)| !issues.is_empty())
            .collect();
        if !issues.is_empty() {
            return Err(Error::Validation(issues));
        }

        if batch.items.is_empty() {
            return Ok(RunResult::default());
        }

        let total = batch.items.len();
        tracing::info!("Starting upload run with {} item(s)", total);

        let mut context = UploadRunContext::new(
            UploadRunOps {
                blob_ops: self.blob_ops.clone(),
                metadata_ops: self.metadata_ops.clone(),
                store: self.store.clone(),
            },
            UploadRunInput {
                parent: batch.parent,
                asset_collection: ASSET_COLLECTION.to_string(),
                total_items: total,
            },
            batch.items,
            progress_tx,
        );
        context
            .publish(UploadEvent::RunStarted { total_items: total })
            .await;

        let pipeline = Pipeline::<UploadRunContext>::new();
        let mut result = RunResult::default();

        for index in 0..total {
            if cancel.is_cancelled() {
                result.cancelled = true;
                context
                    .publish(UploadEvent::RunCancelled {
                        items_left: total - index,
                    })
                    .await;
                break;
            }

            context.begin_item(index);
            context
                .publish(UploadEvent::ItemStarted {
                    index,
                    item_number: index + 1,
                    total_items: total,
                    title: context.items[index].draft.title.clone(),
                })
                .await;

            match pipeline.execute(&mut context, cancel).await {
                Ok(()) => match context.scratch.record_id.take() {
                    Some(record_id) => {
                        let title = context.current_item().draft.title.clone();
                        complete_item(&mut context, &mut result, record_id.clone()).await;
                        if let Err(e) = self
                            .activity
                            .log_activity(ActivityEvent::AssetUploaded { record_id, title })
                            .await
                        {
                            tracing::warn!("Failed to log asset upload activity: {}", e);
                        }
                    }
                    None => {
                        fail_item(
                            &mut context,
                            &mut result,
                            "persist_record",
                            "Record id not set after upload".to_string(),
                        )
                        .await;
                    }
                },
                Err(Error::OperationCancelled) => {
                    result.cancelled = true;
                    let stage = context.current_item().stage.clone();
                    if stage != ItemStage::Idle && !stage.is_terminal() {
                        fail_item(
                            &mut context,
                            &mut result,
                            stage.name(),
                            "Operation was cancelled".to_string(),
                        )
                        .await;
                    }
                    context
                        .publish(UploadEvent::RunCancelled {
                            items_left: total - index - 1,
                        })
                        .await;
                    break;
                }
                Err(Error::Stage { stage, message }) => {
                    fail_item(&mut context, &mut result, stage, message).await;
                }
                Err(e) => {
                    let stage = context.current_item().stage.name();
                    fail_item(&mut context, &mut result, stage, e.to_string()).await;
                }
            }
        }

        // Previews of items the run never reached are released here;
        // terminal items already released theirs.
        for item in &mut context.items {
            item.preview.release();
        }

        if !result.cancelled {
            context
                .publish(UploadEvent::RunCompleted {
                    completed: result.completed.len(),
                    failed: result.errors.len(),
                })
                .await;
        }

        if let Err(e) = self
            .activity
            .log_activity(ActivityEvent::UploadRunCompleted {
                completed: result.completed.len(),
                failed: result.errors.len(),
            })
            .await
        {
            tracing::warn!("Failed to log upload run activity: {}", e);
        }

        tracing::info!(
            "Upload run finished: {} completed, {} failed",
            result.completed.len(),
            result.errors.len()
        );
        Ok(result)
    }
}

async fn complete_item(context: &mut UploadRunContext, result: &mut RunResult, record_id: RecordId) {
    context
        .set_stage(ItemStage::Complete {
            record_id: record_id.clone(),
        })
        .await;
    context.publish_progress(100, "Complete").await;
    let index = context.current_index;
    context.current_item_mut().preview.release();
    result.completed.push(CompletedItem {
        index,
        record_id: record_id.clone(),
    });
    context
        .publish(UploadEvent::ItemCompleted { index, record_id })
        .await;
}

async fn fail_item(
    context: &mut UploadRunContext,
    result: &mut RunResult,
    stage: &'static str,
    error: String,
) {
    tracing::warn!("Item {} failed at {}: {}", context.current_index, stage, error);
    context
        .set_stage(ItemStage::Failed {
            stage,
            error: error.clone(),
        })
        .await;
    let index = context.current_index;
    context.current_item_mut().preview.release();
    result.errors.push(ItemFailure {
        index,
        stage,
        error: error.clone(),
    });
    context
        .publish(UploadEvent::ItemFailed {
            index,
            stage,
            error,
        })
        .await;
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_std::channel::Receiver;
    use core_types::events::UploadEvent;
    use document_store::{RecordRef, mock::MockDocumentStore};
    use media_metadata::{ExtractedMedia, media_metadata_ops::mock::MockMediaMetadataOps};
    use media_store::mock::MockBlobStorage;

    use super::*;
    use crate::{
        activity_log::mock::MockActivityLog,
        staging::{model::IncomingFile, preview::mock::MockPreviewOps, service::AssetStager},
        upload::model::ParentLink,
    };

    struct TestSetup {
        service: UploadService,
        blob_ops: Arc<MockBlobStorage>,
        store: Arc<MockDocumentStore>,
        activity: Arc<MockActivityLog>,
        metadata_ops: Arc<MockMediaMetadataOps>,
    }

    fn prepare_test() -> TestSetup {
        let blob_ops = Arc::new(MockBlobStorage::new());
        let store = Arc::new(MockDocumentStore::new());
        let activity = Arc::new(MockActivityLog::new());
        let metadata_ops = Arc::new(MockMediaMetadataOps::new());
        let service = UploadService::new_with_ops(
            blob_ops.clone(),
            metadata_ops.clone(),
            store.clone(),
            activity.clone(),
        );
        TestSetup {
            service,
            blob_ops,
            store,
            activity,
            metadata_ops,
        }
    }

    fn make_batch(paths: &[&str], parent: Option<ParentLink>) -> (UploadBatch, Arc<MockPreviewOps>) {
        let preview_ops = Arc::new(MockPreviewOps::new());
        let mut stager = AssetStager::new_with_ops(preview_ops.clone());
        let report = stager.stage_files(
            paths
                .iter()
                .map(|path| IncomingFile {
                    path: PathBuf::from(path),
                    size_bytes: 1024,
                })
                .collect(),
        );
        assert_eq!(report.accepted.len(), paths.len());
        let batch = stager.take_batch(parent).unwrap();
        (batch, preview_ops)
    }

    fn drain(rx: &Receiver<UploadEvent>) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn stage_names(events: &[UploadEvent]) -> Vec<&'static str> {
        events
            .iter()
            .filter_map(|event| match event {
                UploadEvent::ItemStageChanged { stage, .. } => Some(*stage),
                _ => None,
            })
            .collect()
    }

    #[async_std::test]
    async fn test_empty_batch_makes_no_external_calls() {
        let setup = prepare_test();
        let batch = UploadBatch::new(Vec::new());

        let result = setup
            .service
            .validate_and_run(batch, None, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result, RunResult::default());
        assert_eq!(setup.blob_ops.uploaded_count(), 0);
        assert_eq!(setup.store.write_call_count(), 0);
        assert_eq!(setup.activity.event_count(), 0);
    }

    #[async_std::test]
    async fn test_all_items_complete() {
        let setup = prepare_test();
        let (batch, preview_ops) = make_batch(&["/media/one.mp4", "/media/two.mp4"], None);

        let result = setup
            .service
            .validate_and_run(batch, None, &CancelToken::new())
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.completed.len(), 2);
        assert!(result.errors.is_empty());
        assert_eq!(setup.store.record_count(ASSET_COLLECTION), 2);
        // two AssetUploaded entries plus the run summary
        assert_eq!(setup.activity.event_count(), 3);
        // no preview handle outlives the run
        assert_eq!(preview_ops.active_count(), 0);
    }

    #[async_std::test]
    async fn test_failed_item_does_not_abort_the_run() {
        let setup = prepare_test();
        let (batch, preview_ops) = make_batch(
            &["/media/one.mp4", "/media/two.mp4", "/media/three.mp4"],
            None,
        );
        setup.blob_ops.fail_upload_matching("two.mp4");

        let result = setup
            .service
            .validate_and_run(batch, None, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.completed_ids().len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].index, 1);
        assert_eq!(result.errors[0].stage, "upload_primary");
        // the items around the failure still persisted
        assert_eq!(setup.store.record_count(ASSET_COLLECTION), 2);
        assert_eq!(preview_ops.active_count(), 0);
    }

    #[async_std::test]
    async fn test_metadata_failure_is_non_fatal() {
        let setup = prepare_test();
        let (batch, _) = make_batch(&["/media/one.mp4"], None);
        setup.metadata_ops.fail_for("/media/one.mp4");

        let (tx, rx) = async_std::channel::unbounded();
        let result = setup
            .service
            .validate_and_run(batch, Some(tx), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.completed.len(), 1);
        assert!(result.errors.is_empty());

        let events = drain(&rx);
        // the item moved on to the primary upload and completed
        assert_eq!(
            stage_names(&events),
            vec!["extract_metadata", "upload_primary", "persist_record", "complete"]
        );
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, UploadEvent::ItemFailed { .. }))
        );
    }

    #[async_std::test]
    async fn test_extracted_thumbnail_is_uploaded_and_recorded() {
        let setup = prepare_test();
        let (batch, _) = make_batch(&["/media/poster.png"], None);
        setup.metadata_ops.add_extracted(
            "/media/poster.png",
            ExtractedMedia {
                width: Some(640),
                height: Some(480),
                thumbnail: Some(PathBuf::from("/tmp/poster-thumb.png")),
                ..Default::default()
            },
        );

        let result = setup
            .service
            .validate_and_run(batch, None, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.completed.len(), 1);
        // primary and derived blob
        assert_eq!(setup.blob_ops.uploaded_count(), 2);
        let record = setup
            .store
            .get_record(ASSET_COLLECTION, &result.completed[0].record_id)
            .unwrap();
        assert!(record.get("thumbnail_url").unwrap().is_string());
    }

    #[async_std::test]
    async fn test_items_link_to_parent_in_batch_order() {
        let setup = prepare_test();
        let parent = ParentLink {
            parent: RecordRef::new("campaigns", "c1"),
        };
        let (batch, _) = make_batch(&["/media/one.mp4", "/media/two.mp4"], Some(parent));

        let result = setup
            .service
            .validate_and_run(batch, None, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.completed.len(), 2);
        let links = setup.store.parent_links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0, RecordRef::new("campaigns", "c1"));
        assert_eq!(links[0].2, 0);
        assert_eq!(links[1].2, 1);
    }

    #[async_std::test]
    async fn test_stage_events_follow_the_fixed_order() {
        let setup = prepare_test();
        let (batch, _) = make_batch(&["/media/one.mp4"], None);

        let (tx, rx) = async_std::channel::unbounded();
        setup
            .service
            .validate_and_run(batch, Some(tx), &CancelToken::new())
            .await
            .unwrap();

        // no thumbnail and no parent, so the conditional stages are absent
        assert_eq!(
            stage_names(&drain(&rx)),
            vec!["extract_metadata", "upload_primary", "persist_record", "complete"]
        );
    }

    #[async_std::test]
    async fn test_validation_issues_block_the_run() {
        let setup = prepare_test();
        let (mut batch, _) = make_batch(&["/media/one.mp4"], None);
        batch.items[0].draft.title = String::new();

        let result = setup
            .service
            .validate_and_run(batch, None, &CancelToken::new())
            .await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(setup.blob_ops.uploaded_count(), 0);
        assert_eq!(setup.store.write_call_count(), 0);
    }

    #[async_std::test]
    async fn test_cancelled_token_stops_the_run_before_any_item() {
        let setup = prepare_test();
        let (batch, preview_ops) = make_batch(&["/media/one.mp4", "/media/two.mp4"], None);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = setup
            .service
            .validate_and_run(batch, None, &cancel)
            .await
            .unwrap();

        assert!(result.cancelled);
        assert!(result.completed.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(setup.blob_ops.uploaded_count(), 0);
        // untouched items still release their previews
        assert_eq!(preview_ops.active_count(), 0);
    }

    #[async_std::test]
    async fn test_persist_failure_is_contained_per_item() {
        let setup = prepare_test();
        let (batch, _) = make_batch(&["/media/one.mp4", "/media/two.mp4"], None);
        setup.store.fail_create();

        let result = setup
            .service
            .validate_and_run(batch, None, &CancelToken::new())
            .await
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().all(|e| e.stage == "persist_record"));
    }

    #[async_std::test]
    async fn test_activity_log_failure_never_fails_the_run() {
        let setup = prepare_test();
        let (batch, _) = make_batch(&["/media/one.mp4"], None);
        setup.activity.fail_all();

        let result = setup
            .service
            .validate_and_run(batch, None, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.completed.len(), 1);
    }
}
