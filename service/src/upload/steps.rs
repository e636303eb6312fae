use core_types::DerivedMetadata;
use core_types::events::{TransferEvent, UploadEvent};
use document_store::{RecordData, RecordRef};

use crate::{
    error::Error,
    pipeline::pipeline_step::{PipelineStep, StepAction},
    upload::{context::UploadRunContext, model::ItemStage},
};

// Each stage owns a band of the item's 0-100 progress scale. The primary
// transfer dominates and gets the widest band.
const BAND_EXTRACT: (u8, u8) = (0, 10);
const BAND_PRIMARY: (u8, u8) = (10, 70);
const BAND_DERIVED: (u8, u8) = (70, 85);
const BAND_PERSIST: (u8, u8) = (85, 95);
const BAND_LINK: (u8, u8) = (95, 100);

/// Remap byte-level transfer progress into a stage's band.
fn band_percent(band: (u8, u8), bytes_sent: u64, total_bytes: u64) -> u8 {
    if total_bytes == 0 {
        return band.1;
    }
    let span = u64::from(band.1 - band.0);
    band.0 + ((bytes_sent.min(total_bytes) * span) / total_bytes) as u8
}

/// Stage 1: probe duration, dimensions and a thumbnail.
///
/// Best-effort by design: a probe failure leaves the derived fields empty
/// and the item moves on to the primary upload regardless.
pub struct ExtractMetadataStep;

#[async_trait::async_trait]
impl PipelineStep<UploadRunContext> for ExtractMetadataStep {
    fn name(&self) -> &'static str {
        "extract_metadata"
    }

    async fn execute(&self, context: &mut UploadRunContext) -> StepAction {
        context.set_stage(ItemStage::ExtractingMetadata).await;
        context
            .publish_progress(BAND_EXTRACT.0, "Extracting metadata")
            .await;

        let item = context.current_item();
        let path = item.source.path.clone();
        let kind = item.source.kind;

        match context.ops.metadata_ops.extract(&path, kind) {
            Ok(extracted) => {
                let item = context.current_item_mut();
                item.derived = DerivedMetadata {
                    duration_secs: extracted.duration_secs,
                    width: extracted.width,
                    height: extracted.height,
                    thumbnail: extracted.thumbnail,
                };
            }
            Err(e) => {
                tracing::warn!(
                    "Metadata extraction failed for {}, continuing without derived metadata: {}",
                    path.display(),
                    e
                );
                context
                    .scratch
                    .soft_failures
                    .insert(self.name().to_string(), e.into());
                context.current_item_mut().message = "Derived metadata unavailable".to_string();
            }
        }

        context
            .publish_progress(BAND_EXTRACT.1, "Preparing upload")
            .await;
        StepAction::Continue
    }
}

/// Stage 2: transfer the media file itself. Transport progress is
/// remapped into this stage's band and forwarded for the active item
/// only.
pub struct UploadPrimaryStep;

#[async_trait::async_trait]
impl PipelineStep<UploadRunContext> for UploadPrimaryStep {
    fn name(&self) -> &'static str {
        "upload_primary"
    }

    async fn execute(&self, context: &mut UploadRunContext) -> StepAction {
        context.set_stage(ItemStage::UploadingPrimary).await;

        let item = context.current_item();
        let key = format!(
            "{}/{}/{}",
            item.source.kind.storage_prefix(),
            uuid::Uuid::new_v4(),
            item.source.file_name
        );
        let path = item.source.path.clone();
        let index = context.current_index;

        // Forward transport events as band-mapped item progress. The
        // forwarder drains until the transfer side is dropped.
        let (transfer_tx, forwarder) = match &context.progress_tx {
            Some(run_tx) => {
                let (tx, rx) = async_std::channel::unbounded::<TransferEvent>();
                let run_tx = run_tx.clone();
                let handle = async_std::task::spawn(async move {
                    while let Ok(event) = rx.recv().await {
                        if let TransferEvent::PartUploaded {
                            bytes_sent,
                            total_bytes,
                            ..
                        } = event
                        {
                            run_tx
                                .send(UploadEvent::ItemProgress {
                                    index,
                                    percent: band_percent(BAND_PRIMARY, bytes_sent, total_bytes),
                                    message: "Uploading media".to_string(),
                                })
                                .await
                                .ok();
                        }
                    }
                });
                (Some(tx), Some(handle))
            }
            None => (None, None),
        };

        let result = context
            .ops
            .blob_ops
            .upload_blob(&path, &key, transfer_tx.as_ref())
            .await;

        drop(transfer_tx);
        if let Some(handle) = forwarder {
            handle.await;
        }

        match result {
            Ok(url) => {
                context.scratch.blob_key = Some(key);
                context.scratch.primary_url = Some(url);
                context
                    .publish_progress(BAND_PRIMARY.1, "Media uploaded")
                    .await;
                StepAction::Continue
            }
            Err(e) => StepAction::Abort(Error::Stage {
                stage: self.name(),
                message: e.to_string(),
            }),
        }
    }
}

/// Stage 3: transfer the derived thumbnail, when extraction produced one.
pub struct UploadDerivedStep;

#[async_trait::async_trait]
impl PipelineStep<UploadRunContext> for UploadDerivedStep {
    fn name(&self) -> &'static str {
        "upload_derived"
    }

    fn should_execute(&self, context: &UploadRunContext) -> bool {
        context.current_item().derived.thumbnail.is_some()
    }

    async fn execute(&self, context: &mut UploadRunContext) -> StepAction {
        context.set_stage(ItemStage::UploadingDerived).await;

        let Some(thumbnail_path) = context.current_item().derived.thumbnail.clone() else {
            // should_execute guards this; nothing to upload
            return StepAction::Continue;
        };
        let key = match &context.scratch.blob_key {
            Some(blob_key) => format!("{}.thumb.png", blob_key),
            None => {
                return StepAction::Abort(Error::Stage {
                    stage: self.name(),
                    message: "Primary blob key not set before derived upload".to_string(),
                });
            }
        };

        match context
            .ops
            .blob_ops
            .upload_blob(&thumbnail_path, &key, None)
            .await
        {
            Ok(url) => {
                context.scratch.thumbnail_url = Some(url);
                context
                    .publish_progress(BAND_DERIVED.1, "Thumbnail uploaded")
                    .await;
                StepAction::Continue
            }
            Err(e) => StepAction::Abort(Error::Stage {
                stage: self.name(),
                message: e.to_string(),
            }),
        }
    }
}

/// Stage 4: persist the asset record.
pub struct PersistRecordStep;

#[async_trait::async_trait]
impl PipelineStep<UploadRunContext> for PersistRecordStep {
    fn name(&self) -> &'static str {
        "persist_record"
    }

    async fn execute(&self, context: &mut UploadRunContext) -> StepAction {
        context.set_stage(ItemStage::PersistingRecord).await;

        let item = context.current_item();
        let mut data = RecordData::new();
        data.insert("title".to_string(), serde_json::json!(item.draft.title));
        data.insert(
            "description".to_string(),
            serde_json::json!(item.draft.description),
        );
        data.insert("tags".to_string(), serde_json::json!(item.draft.tags));
        data.insert(
            "access_scope".to_string(),
            serde_json::json!(item.draft.access_scope.to_string()),
        );
        data.insert(
            "organization_ids".to_string(),
            serde_json::json!(item.draft.organization_ids),
        );
        data.insert(
            "media_kind".to_string(),
            serde_json::json!(item.source.kind.to_string()),
        );
        data.insert(
            "file_name".to_string(),
            serde_json::json!(item.source.file_name),
        );
        data.insert(
            "size_bytes".to_string(),
            serde_json::json!(item.source.size_bytes),
        );
        data.insert(
            "primary_url".to_string(),
            serde_json::json!(context.scratch.primary_url),
        );
        data.insert(
            "thumbnail_url".to_string(),
            serde_json::json!(context.scratch.thumbnail_url),
        );
        data.insert(
            "duration_secs".to_string(),
            serde_json::json!(item.derived.duration_secs),
        );

        match context
            .ops
            .store
            .create_record(&context.input.asset_collection, data)
            .await
        {
            Ok(record_id) => {
                context.scratch.record_id = Some(record_id);
                context.publish_progress(BAND_PERSIST.1, "Record saved").await;
                StepAction::Continue
            }
            Err(e) => StepAction::Abort(Error::Stage {
                stage: self.name(),
                message: e.to_string(),
            }),
        }
    }
}

/// Stage 5: link the new asset into its parent's ordered child list.
/// Only runs for batches targeted at a parent.
pub struct LinkToParentStep;

#[async_trait::async_trait]
impl PipelineStep<UploadRunContext> for LinkToParentStep {
    fn name(&self) -> &'static str {
        "link_to_parent"
    }

    fn should_execute(&self, context: &UploadRunContext) -> bool {
        context.input.parent.is_some()
    }

    async fn execute(&self, context: &mut UploadRunContext) -> StepAction {
        context.set_stage(ItemStage::LinkingToParent).await;

        let Some(parent_link) = context.input.parent.clone() else {
            return StepAction::Continue;
        };
        let Some(record_id) = context.scratch.record_id.clone() else {
            return StepAction::Abort(Error::Stage {
                stage: self.name(),
                message: "Record id not set before linking".to_string(),
            });
        };

        let child = RecordRef::new(context.input.asset_collection.clone(), record_id);
        let order = context.current_index as u32;

        match context
            .ops
            .store
            .set_parent_link(&parent_link.parent, &child, order)
            .await
        {
            Ok(()) => {
                context.publish_progress(BAND_LINK.1, "Linked to parent").await;
                StepAction::Continue
            }
            Err(e) => StepAction::Abort(Error::Stage {
                stage: self.name(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_percent_remaps_into_band() {
        assert_eq!(band_percent(BAND_PRIMARY, 0, 100), 10);
        assert_eq!(band_percent(BAND_PRIMARY, 50, 100), 40);
        assert_eq!(band_percent(BAND_PRIMARY, 100, 100), 70);
        // over-reported bytes clamp to the band end
        assert_eq!(band_percent(BAND_PRIMARY, 150, 100), 70);
        // unknown total reports the band end
        assert_eq!(band_percent(BAND_PRIMARY, 0, 0), 70);
    }
}
