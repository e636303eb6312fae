//! Progress event enums published over channels during long operations.
//!
//! Senders are always optional and sends are never allowed to fail an
//! operation; a dropped receiver simply stops observation.

use crate::RecordId;

/// Byte-level transfer progress published by a blob transport while a
/// single object is being uploaded.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    Started {
        key: String,
        total_bytes: u64,
    },
    PartUploaded {
        key: String,
        part: u32,
        bytes_sent: u64,
        total_bytes: u64,
    },
    PartUploadFailed {
        key: String,
        error: String,
    },
    Completed {
        key: String,
        url: String,
    },
}

/// Run-level progress for a batch upload. `item_number` is 1-based for
/// display; `index` is the stable queue index of the item.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    RunStarted {
        total_items: usize,
    },
    ItemStarted {
        index: usize,
        item_number: usize,
        total_items: usize,
        title: String,
    },
    ItemStageChanged {
        index: usize,
        stage: &'static str,
    },
    ItemProgress {
        index: usize,
        percent: u8,
        message: String,
    },
    ItemCompleted {
        index: usize,
        record_id: RecordId,
    },
    ItemFailed {
        index: usize,
        stage: &'static str,
        error: String,
    },
    RunCancelled {
        items_left: usize,
    },
    RunCompleted {
        completed: usize,
        failed: usize,
    },
}

/// Progress of a cascading deletion.
#[derive(Debug, Clone)]
pub enum DeletionEvent {
    DiscoveryStarted {
        root_collection: String,
        root_id: RecordId,
        dependent_collections: usize,
    },
    CollectionDiscovered {
        collection: String,
        dependents: usize,
    },
    BatchCommitted {
        batch_number: usize,
        mutations: usize,
    },
    DeletionCompleted {
        dependents_removed: usize,
        batches_committed: usize,
    },
}
