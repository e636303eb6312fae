use core_types::RecordId;
use document_store::{DocumentStoreOps, RecordRef};

use crate::error::Error;

/// One logical foreign-key discovery against a dependent collection.
///
/// The id index is consulted first; the live record references behind
/// those ids are then fetched in chunks of at most `max_in_values` ids
/// and merged, so the provider's filter-cardinality cap never surfaces
/// to callers. Ids whose record no longer exists fall out of the result.
///
/// Read-only: no call in here mutates the store.
pub async fn discover_by_foreign_key(
    store: &dyn DocumentStoreOps,
    collection: &str,
    foreign_key: &str,
    root_id: &RecordId,
) -> Result<Vec<RecordRef>, Error> {
    let ids = store
        .list_ids_where(collection, foreign_key, root_id)
        .await
        .map_err(|e| {
            Error::Discovery(format!(
                "Failed to list ids in '{}' referencing {}: {}",
                collection, root_id, e
            ))
        })?;

    let chunk_size = store.max_in_values().max(1);
    let mut refs = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(chunk_size) {
        let fetched = store
            .fetch_refs_by_ids(collection, chunk)
            .await
            .map_err(|e| {
                Error::Discovery(format!(
                    "Failed to fetch records from '{}': {}",
                    collection, e
                ))
            })?;
        refs.extend(fetched);
    }

    tracing::info!(
        "Discovered {} dependent(s) in '{}' referencing {}",
        refs.len(),
        collection,
        root_id
    );
    Ok(refs)
}
