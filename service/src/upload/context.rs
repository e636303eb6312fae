use std::collections::HashMap;
use std::sync::Arc;

use async_std::channel::Sender;
use core_types::{RecordId, events::UploadEvent};
use document_store::DocumentStoreOps;
use media_metadata::MediaMetadataOps;
use media_store::BlobTransferOps;

use crate::{
    error::Error,
    staging::model::StagedItem,
    upload::model::{ItemStage, ParentLink},
};

pub struct UploadRunOps {
    pub blob_ops: Arc<dyn BlobTransferOps>,
    pub metadata_ops: Arc<dyn MediaMetadataOps>,
    pub store: Arc<dyn DocumentStoreOps>,
}

pub struct UploadRunInput {
    pub parent: Option<ParentLink>,
    pub asset_collection: String,
    pub total_items: usize,
}

/// Per-item working data, reset when the run moves to the next item.
#[derive(Default)]
pub struct UploadItemScratch {
    pub blob_key: Option<String>,
    pub primary_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub record_id: Option<RecordId>,
    /// Steps whose failure does not fail the item collect here.
    pub soft_failures: HashMap<String, Error>,
}

/// State of one batch run. Owns every queued item for the duration of
/// the run; `current_index` is the single active item, and only that
/// item's progress is ever published.
pub struct UploadRunContext {
    pub ops: UploadRunOps,
    pub input: UploadRunInput,
    pub items: Vec<StagedItem>,
    pub current_index: usize,
    pub scratch: UploadItemScratch,
    pub progress_tx: Option<Sender<UploadEvent>>,
}

impl UploadRunContext {
    pub fn new(
        ops: UploadRunOps,
        input: UploadRunInput,
        items: Vec<StagedItem>,
        progress_tx: Option<Sender<UploadEvent>>,
    ) -> Self {
        Self {
            ops,
            input,
            items,
            current_index: 0,
            scratch: UploadItemScratch::default(),
            progress_tx,
        }
    }

    /// Point the run at the next item and clear the per-item scratch.
    pub fn begin_item(&mut self, index: usize) {
        self.current_index = index;
        self.scratch = UploadItemScratch::default();
    }

    pub fn current_item(&self) -> &StagedItem {
        &self.items[self.current_index]
    }

    pub fn current_item_mut(&mut self) -> &mut StagedItem {
        &mut self.items[self.current_index]
    }

    /// Move the active item to a new stage and announce the transition.
    pub async fn set_stage(&mut self, stage: ItemStage) {
        let name = stage.name();
        let index = self.current_index;
        self.current_item_mut().stage = stage;
        self.publish(UploadEvent::ItemStageChanged { index, stage: name })
            .await;
    }

    /// Update the active item's progress and announce it.
    pub async fn publish_progress(&mut self, percent: u8, message: &str) {
        let index = self.current_index;
        {
            let item = self.current_item_mut();
            item.progress_percent = percent;
            item.message = message.to_string();
        }
        self.publish(UploadEvent::ItemProgress {
            index,
            percent,
            message: message.to_string(),
        })
        .await;
    }

    pub async fn publish(&self, event: UploadEvent) {
        if let Some(tx) = &self.progress_tx {
            tx.send(event).await.ok();
        }
    }
}
