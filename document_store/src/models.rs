use core_types::RecordId;

/// Field values of a document store record.
pub type RecordData = serde_json::Map<String, serde_json::Value>;

/// Reference to a single record: collection name plus record id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordRef {
    pub collection: String,
    pub id: RecordId,
}

impl RecordRef {
    pub fn new(collection: impl Into<String>, id: impl Into<RecordId>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
