use core_types::RecordId;
use document_store::RecordRef;

/// One collection whose records reference the root through a foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct DependentCollection {
    pub collection: String,
    pub foreign_key: String,
}

impl DependentCollection {
    pub fn new(collection: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

/// Static cascade configuration: the root plus every collection that may
/// reference it. Preset constructors cover the platform's entity graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionRequest {
    pub root: RecordRef,
    pub dependents: Vec<DependentCollection>,
}

impl DeletionRequest {
    pub fn new(root: RecordRef, dependents: Vec<DependentCollection>) -> Self {
        Self { root, dependents }
    }

    /// Cascade for a client organization: its users, campaigns and
    /// pending notifications all go with it.
    pub fn client_organization(organization_id: impl Into<RecordId>) -> Self {
        Self {
            root: RecordRef::new("clients", organization_id),
            dependents: vec![
                DependentCollection::new("users", "organization_id"),
                DependentCollection::new("campaigns", "organization_id"),
                DependentCollection::new("notifications", "organization_id"),
            ],
        }
    }

    /// Cascade for a media asset: campaign entries built from it and
    /// per-user watch progress against it.
    pub fn media_asset(asset_id: impl Into<RecordId>) -> Self {
        Self {
            root: RecordRef::new("assets", asset_id),
            dependents: vec![
                DependentCollection::new("campaign_items", "asset_id"),
                DependentCollection::new("watch_progress", "asset_id"),
            ],
        }
    }
}

/// Everything discovery found, grouped by collection. Built completely
/// before the first mutation and consumed once by commit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeletionPlan {
    pub collections: Vec<(String, Vec<RecordRef>)>,
}

impl DeletionPlan {
    pub fn dependent_count(&self) -> usize {
        self.collections.iter().map(|(_, refs)| refs.len()).sum()
    }

    pub fn dependents(&self) -> impl Iterator<Item = &RecordRef> {
        self.collections.iter().flat_map(|(_, refs)| refs.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteOutcome {
    pub dependents_removed: usize,
    pub batches_committed: usize,
}
