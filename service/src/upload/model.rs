use core_types::RecordId;
use document_store::RecordRef;

use crate::staging::model::StagedItem;

/// Collection asset records are persisted into.
pub const ASSET_COLLECTION: &str = "assets";

/// Processing state of one queued item.
///
/// The sequence is fixed; an item either walks it front to back or jumps
/// to `Failed` from a non-terminal stage. Each variant carries only the
/// data valid in that state: the record id exists once complete, the
/// error detail exists once failed, never otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemStage {
    Idle,
    ExtractingMetadata,
    UploadingPrimary,
    UploadingDerived,
    PersistingRecord,
    LinkingToParent,
    Complete {
        record_id: RecordId,
    },
    Failed {
        stage: &'static str,
        error: String,
    },
}

impl ItemStage {
    /// Position in the fixed stage order, for monotonicity checks.
    pub fn rank(&self) -> u8 {
        match self {
            ItemStage::Idle => 0,
            ItemStage::ExtractingMetadata => 1,
            ItemStage::UploadingPrimary => 2,
            ItemStage::UploadingDerived => 3,
            ItemStage::PersistingRecord => 4,
            ItemStage::LinkingToParent => 5,
            ItemStage::Complete { .. } => 6,
            ItemStage::Failed { .. } => 7,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStage::Complete { .. } | ItemStage::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ItemStage::Idle => "idle",
            ItemStage::ExtractingMetadata => "extract_metadata",
            ItemStage::UploadingPrimary => "upload_primary",
            ItemStage::UploadingDerived => "upload_derived",
            ItemStage::PersistingRecord => "persist_record",
            ItemStage::LinkingToParent => "link_to_parent",
            ItemStage::Complete { .. } => "complete",
            ItemStage::Failed { .. } => "failed",
        }
    }
}

/// Target the uploaded assets are linked into, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentLink {
    pub parent: RecordRef,
}

/// The queue a run owns exclusively from start to finish.
#[derive(Debug)]
pub struct UploadBatch {
    pub items: Vec<StagedItem>,
    pub parent: Option<ParentLink>,
}

impl UploadBatch {
    pub fn new(items: Vec<StagedItem>) -> Self {
        Self {
            items,
            parent: None,
        }
    }

    pub fn with_parent(items: Vec<StagedItem>, parent: ParentLink) -> Self {
        Self {
            items,
            parent: Some(parent),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedItem {
    pub index: usize,
    pub record_id: RecordId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub index: usize,
    pub stage: &'static str,
    pub error: String,
}

/// Run-level summary. Produced for every run, partial failure included;
/// a run succeeded when at least one item completed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunResult {
    pub completed: Vec<CompletedItem>,
    pub errors: Vec<ItemFailure>,
    pub cancelled: bool,
}

impl RunResult {
    pub fn completed_ids(&self) -> Vec<RecordId> {
        self.completed
            .iter()
            .map(|item| item.record_id.clone())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        !self.completed.is_empty()
    }
}
