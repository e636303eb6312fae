use crate::{
    pipeline::generic_pipeline::Pipeline,
    upload::{
        context::UploadRunContext,
        steps::{
            ExtractMetadataStep, LinkToParentStep, PersistRecordStep, UploadDerivedStep,
            UploadPrimaryStep,
        },
    },
};

impl Pipeline<UploadRunContext> {
    /// The fixed per-item stage sequence.
    pub fn new() -> Self {
        Self::with_steps(vec![
            Box::new(ExtractMetadataStep),
            Box::new(UploadPrimaryStep),
            Box::new(UploadDerivedStep),
            Box::new(PersistRecordStep),
            Box::new(LinkToParentStep),
        ])
    }
}

impl Default for Pipeline<UploadRunContext> {
    fn default() -> Self {
        Self::new()
    }
}
