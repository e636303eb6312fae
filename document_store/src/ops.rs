use async_trait::async_trait;
use core_types::RecordId;

use crate::{
    models::{RecordData, RecordRef},
    store_error::StoreError,
};

/// Cardinality cap of an "any of these ids" query filter.
pub const DEFAULT_MAX_IN_VALUES: usize = 10;

/// Mutation cap of one atomic batched write.
pub const DEFAULT_MAX_BATCH_MUTATIONS: usize = 500;

/// Trait for document store access to enable testing.
///
/// The store itself is a managed external service; this crate only defines
/// the operations the orchestration core consumes. Reads and writes are
/// strictly separated so callers can guarantee read-only phases.
#[async_trait]
pub trait DocumentStoreOps: Send + Sync {
    /// Persist a new record and return its generated id.
    async fn create_record(
        &self,
        collection: &str,
        data: RecordData,
    ) -> Result<RecordId, StoreError>;

    /// Link a child record into its parent's ordered child list.
    async fn set_parent_link(
        &self,
        parent: &RecordRef,
        child: &RecordRef,
        order: u32,
    ) -> Result<(), StoreError>;

    /// Ids of records in `collection` whose `field` equals `value`.
    /// Index-only lookup, no cardinality limit.
    async fn list_ids_where(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<RecordId>, StoreError>;

    /// Fetch references for the records among `ids` that currently exist.
    /// The provider caps `ids.len()` at [`DocumentStoreOps::max_in_values`];
    /// oversized calls are rejected with a query error.
    async fn fetch_refs_by_ids(
        &self,
        collection: &str,
        ids: &[RecordId],
    ) -> Result<Vec<RecordRef>, StoreError>;

    /// Start an atomic batched write.
    fn write_batch(&self) -> Box<dyn WriteBatchOps>;

    fn max_in_values(&self) -> usize {
        DEFAULT_MAX_IN_VALUES
    }

    fn max_batch_mutations(&self) -> usize {
        DEFAULT_MAX_BATCH_MUTATIONS
    }
}

/// One atomic set of mutations. Nothing is applied until `commit`; a
/// committed batch applies completely or not at all. Atomicity holds per
/// batch only, never across batches.
#[async_trait]
pub trait WriteBatchOps: Send {
    /// Enqueue deletion of a record.
    fn delete(&mut self, record: &RecordRef);

    /// Number of mutations queued so far.
    fn mutation_count(&self) -> usize;

    /// Apply every queued mutation atomically.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
