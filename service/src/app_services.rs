use std::sync::{Arc, OnceLock};

use document_store::DocumentStoreOps;
use media_store::BlobTransferOps;

use crate::{
    deletion::service::DeletionService, staging::service::AssetStager,
    upload::service::UploadService,
};

/// Lazily wired service container for an embedding console application.
///
/// The document store and blob transport are the external collaborators
/// the embedder provides; everything else is built on first use.
pub struct AppServices {
    upload: OnceLock<Arc<UploadService>>,
    deletion: OnceLock<Arc<DeletionService>>,
    store: Arc<dyn DocumentStoreOps>,
    blob_ops: Arc<dyn BlobTransferOps>,
}

impl AppServices {
    pub fn new(store: Arc<dyn DocumentStoreOps>, blob_ops: Arc<dyn BlobTransferOps>) -> Self {
        Self {
            upload: OnceLock::new(),
            deletion: OnceLock::new(),
            store,
            blob_ops,
        }
    }

    pub fn upload(&self) -> Arc<UploadService> {
        self.upload
            .get_or_init(|| {
                Arc::new(UploadService::new(
                    Arc::clone(&self.blob_ops),
                    Arc::clone(&self.store),
                ))
            })
            .clone()
    }

    pub fn deletion(&self) -> Arc<DeletionService> {
        self.deletion
            .get_or_init(|| Arc::new(DeletionService::new(Arc::clone(&self.store))))
            .clone()
    }

    /// A fresh staging queue; each staging surface owns its own.
    pub fn new_stager(&self) -> AssetStager {
        AssetStager::new()
    }
}
