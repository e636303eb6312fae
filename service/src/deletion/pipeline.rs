use crate::{
    deletion::{
        context::DeletionContext,
        steps::{CommitDeletionStep, DiscoverDependentsStep},
    },
    pipeline::generic_pipeline::Pipeline,
};

impl Pipeline<DeletionContext> {
    /// The two-phase cascade: read-only discovery, then batched commit.
    pub fn new() -> Self {
        Self::with_steps(vec![
            Box::new(DiscoverDependentsStep),
            Box::new(CommitDeletionStep),
        ])
    }
}

impl Default for Pipeline<DeletionContext> {
    fn default() -> Self {
        Self::new()
    }
}
