use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use core_types::RecordId;

use crate::{
    models::{RecordData, RecordRef},
    ops::{DEFAULT_MAX_BATCH_MUTATIONS, DEFAULT_MAX_IN_VALUES, DocumentStoreOps, WriteBatchOps},
    store_error::StoreError,
};

/// Internal state for MockDocumentStore.
///
/// Groups all mutable state into a single struct for simplified locking.
#[derive(Default)]
struct MockState {
    /// collection -> id -> fields
    records: BTreeMap<String, BTreeMap<RecordId, RecordData>>,
    /// parent/child links created through set_parent_link
    parent_links: Vec<(RecordRef, RecordRef, u32)>,
    next_id: u64,
    /// (collection, ids.len()) per fetch_refs_by_ids call
    fetch_calls: Vec<(String, usize)>,
    /// Total number of mutating calls (creates, links, batch commits)
    write_calls: usize,
    /// Mutation count of each committed batch, in commit order
    committed_batches: Vec<usize>,
    fail_list_for: HashSet<String>,
    fail_fetch_for: HashSet<String>,
    fail_create: bool,
    fail_link: bool,
    /// Commit of the batch with this 0-based index fails without applying
    fail_commit_at: Option<usize>,
    max_in_values: usize,
    max_batch_mutations: usize,
}

/// Mock implementation of DocumentStoreOps for testing
///
/// This mock allows you to:
/// - Seed records and verify which were created or deleted
/// - Simulate query and commit failures
/// - Verify query chunking and batch splitting against provider limits
/// - Assert that read-only phases issued zero writes
#[derive(Clone)]
pub struct MockDocumentStore {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                max_in_values: DEFAULT_MAX_IN_VALUES,
                max_batch_mutations: DEFAULT_MAX_BATCH_MUTATIONS,
                ..Default::default()
            })),
        }
    }
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record with the given id and fields.
    pub fn add_record(&self, collection: &str, id: impl Into<RecordId>, data: RecordData) {
        let mut state = self.state.lock().unwrap();
        state
            .records
            .entry(collection.to_string())
            .or_default()
            .insert(id.into(), data);
    }

    /// Seed a record carrying a single foreign key field.
    pub fn add_record_with_fk(
        &self,
        collection: &str,
        id: impl Into<RecordId>,
        fk_field: &str,
        fk_value: &str,
    ) {
        let mut data = RecordData::new();
        data.insert(
            fk_field.to_string(),
            serde_json::Value::String(fk_value.to_string()),
        );
        self.add_record(collection, id, data);
    }

    pub fn contains(&self, collection: &str, id: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .records
            .get(collection)
            .is_some_and(|records| records.contains_key(id))
    }

    pub fn record_count(&self, collection: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.records.get(collection).map_or(0, BTreeMap::len)
    }

    pub fn get_record(&self, collection: &str, id: &str) -> Option<RecordData> {
        let state = self.state.lock().unwrap();
        state
            .records
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned()
    }

    pub fn parent_links(&self) -> Vec<(RecordRef, RecordRef, u32)> {
        let state = self.state.lock().unwrap();
        state.parent_links.clone()
    }

    /// Number of fetch_refs_by_ids calls issued against a collection.
    pub fn fetch_call_count(&self, collection: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .fetch_calls
            .iter()
            .filter(|(c, _)| c == collection)
            .count()
    }

    /// Total mutating calls observed (creates, links and batch commits).
    pub fn write_call_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.write_calls
    }

    /// Mutation counts of committed batches, in commit order.
    pub fn committed_batch_sizes(&self) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state.committed_batches.clone()
    }

    pub fn fail_list_for(&self, collection: &str) {
        let mut state = self.state.lock().unwrap();
        state.fail_list_for.insert(collection.to_string());
    }

    pub fn fail_fetch_for(&self, collection: &str) {
        let mut state = self.state.lock().unwrap();
        state.fail_fetch_for.insert(collection.to_string());
    }

    pub fn fail_create(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_create = true;
    }

    pub fn fail_link(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_link = true;
    }

    /// Make the commit of the batch with the given 0-based index fail.
    pub fn fail_commit_at(&self, batch_index: usize) {
        let mut state = self.state.lock().unwrap();
        state.fail_commit_at = Some(batch_index);
    }

    pub fn set_max_in_values(&self, limit: usize) {
        let mut state = self.state.lock().unwrap();
        state.max_in_values = limit;
    }

    pub fn set_max_batch_mutations(&self, limit: usize) {
        let mut state = self.state.lock().unwrap();
        state.max_batch_mutations = limit;
    }
}

#[async_trait]
impl DocumentStoreOps for MockDocumentStore {
    async fn create_record(
        &self,
        collection: &str,
        data: RecordData,
    ) -> Result<RecordId, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(StoreError::Write(format!(
                "Mock create failure for collection: {}",
                collection
            )));
        }
        state.next_id += 1;
        let id = format!("r{}", state.next_id);
        state
            .records
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        state.write_calls += 1;
        Ok(id)
    }

    async fn set_parent_link(
        &self,
        parent: &RecordRef,
        child: &RecordRef,
        order: u32,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_link {
            return Err(StoreError::Write(format!(
                "Mock link failure for parent: {}",
                parent
            )));
        }
        state
            .parent_links
            .push((parent.clone(), child.clone(), order));
        state.write_calls += 1;
        Ok(())
    }

    async fn list_ids_where(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<RecordId>, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_list_for.contains(collection) {
            return Err(StoreError::Query(format!(
                "Mock list failure for collection: {}",
                collection
            )));
        }
        let ids = state
            .records
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|(_, data)| {
                        data.get(field).and_then(|v| v.as_str()) == Some(value)
                    })
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    async fn fetch_refs_by_ids(
        &self,
        collection: &str,
        ids: &[RecordId],
    ) -> Result<Vec<RecordRef>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let limit = state.max_in_values;
        if ids.len() > limit {
            return Err(StoreError::Query(format!(
                "Id filter holds {} values, provider limit is {}",
                ids.len(),
                limit
            )));
        }
        if state.fail_fetch_for.contains(collection) {
            return Err(StoreError::Query(format!(
                "Mock fetch failure for collection: {}",
                collection
            )));
        }
        state.fetch_calls.push((collection.to_string(), ids.len()));
        let refs = state
            .records
            .get(collection)
            .map(|records| {
                ids.iter()
                    .filter(|id| records.contains_key(*id))
                    .map(|id| RecordRef::new(collection, id.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(refs)
    }

    fn write_batch(&self) -> Box<dyn WriteBatchOps> {
        Box::new(MockWriteBatch {
            store: self.clone(),
            deletes: Vec::new(),
        })
    }

    fn max_in_values(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.max_in_values
    }

    fn max_batch_mutations(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.max_batch_mutations
    }
}

pub struct MockWriteBatch {
    store: MockDocumentStore,
    deletes: Vec<RecordRef>,
}

#[async_trait]
impl WriteBatchOps for MockWriteBatch {
    fn delete(&mut self, record: &RecordRef) {
        self.deletes.push(record.clone());
    }

    fn mutation_count(&self) -> usize {
        self.deletes.len()
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut state = self.store.state.lock().unwrap();
        if self.deletes.len() > state.max_batch_mutations {
            return Err(StoreError::InvalidArgument(format!(
                "Batch holds {} mutations, provider limit is {}",
                self.deletes.len(),
                state.max_batch_mutations
            )));
        }
        let batch_index = state.committed_batches.len();
        if state.fail_commit_at == Some(batch_index) {
            return Err(StoreError::Write(format!(
                "Mock commit failure for batch {}",
                batch_index
            )));
        }
        for record in &self.deletes {
            if let Some(records) = state.records.get_mut(&record.collection) {
                records.remove(&record.id);
            }
        }
        state.committed_batches.push(self.deletes.len());
        state.write_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_std::test]
    async fn test_create_and_fetch() {
        let mock = MockDocumentStore::new();

        let id = mock
            .create_record("assets", RecordData::new())
            .await
            .unwrap();

        assert!(mock.contains("assets", &id));
        let refs = mock
            .fetch_refs_by_ids("assets", &[id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(refs, vec![RecordRef::new("assets", id)]);
    }

    #[async_std::test]
    async fn test_list_ids_where_matches_field() {
        let mock = MockDocumentStore::new();
        mock.add_record_with_fk("users", "u1", "organization_id", "org1");
        mock.add_record_with_fk("users", "u2", "organization_id", "org2");

        let ids = mock
            .list_ids_where("users", "organization_id", "org1")
            .await
            .unwrap();
        assert_eq!(ids, vec!["u1".to_string()]);
    }

    #[async_std::test]
    async fn test_fetch_rejects_oversized_id_filter() {
        let mock = MockDocumentStore::new();
        mock.set_max_in_values(2);

        let ids: Vec<RecordId> = vec!["a".into(), "b".into(), "c".into()];
        let result = mock.fetch_refs_by_ids("users", &ids).await;
        assert!(result.is_err());
        // rejected calls are not recorded
        assert_eq!(mock.fetch_call_count("users"), 0);
    }

    #[async_std::test]
    async fn test_batch_commit_is_atomic() {
        let mock = MockDocumentStore::new();
        mock.add_record_with_fk("users", "u1", "organization_id", "org1");
        mock.add_record_with_fk("users", "u2", "organization_id", "org1");
        mock.fail_commit_at(0);

        let mut batch = mock.write_batch();
        batch.delete(&RecordRef::new("users", "u1"));
        batch.delete(&RecordRef::new("users", "u2"));
        let result = batch.commit().await;

        assert!(result.is_err());
        assert!(mock.contains("users", "u1"));
        assert!(mock.contains("users", "u2"));
        assert!(mock.committed_batch_sizes().is_empty());
    }

    #[async_std::test]
    async fn test_batch_commit_applies_all_deletes() {
        let mock = MockDocumentStore::new();
        mock.add_record_with_fk("users", "u1", "organization_id", "org1");
        mock.add_record_with_fk("users", "u2", "organization_id", "org1");

        let mut batch = mock.write_batch();
        batch.delete(&RecordRef::new("users", "u1"));
        batch.delete(&RecordRef::new("users", "u2"));
        assert_eq!(batch.mutation_count(), 2);
        batch.commit().await.unwrap();

        assert_eq!(mock.record_count("users"), 0);
        assert_eq!(mock.committed_batch_sizes(), vec![2]);
        assert_eq!(mock.write_call_count(), 1);
    }

    #[async_std::test]
    async fn test_reads_do_not_count_as_writes() {
        let mock = MockDocumentStore::new();
        mock.add_record_with_fk("users", "u1", "organization_id", "org1");

        mock.list_ids_where("users", "organization_id", "org1")
            .await
            .unwrap();
        mock.fetch_refs_by_ids("users", &["u1".to_string()])
            .await
            .unwrap();

        assert_eq!(mock.write_call_count(), 0);
        assert_eq!(mock.fetch_call_count("users"), 1);
    }
}
