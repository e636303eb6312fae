use std::sync::Arc;

use core_types::{MediaKind, SourceFile};

use crate::{
    error::Error,
    staging::{
        model::{DraftPatch, IncomingFile, RejectedFile, StagedItem, StagingError, StagingReport},
        preview::{PreviewHandle, PreviewOps, StdPreviewOps},
        validate::{ValidationIssue, validate_draft},
    },
    upload::model::{ParentLink, UploadBatch},
};

/// In-memory queue of items awaiting upload.
///
/// The stager owns the queue until a run takes it; from that point the
/// run owns every item exclusively and the stager is empty again.
pub struct AssetStager {
    items: Vec<StagedItem>,
    preview_ops: Arc<dyn PreviewOps>,
}

impl Default for AssetStager {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetStager {
    pub fn new() -> Self {
        Self::new_with_ops(Arc::new(StdPreviewOps))
    }

    pub fn new_with_ops(preview_ops: Arc<dyn PreviewOps>) -> Self {
        Self {
            items: Vec::new(),
            preview_ops,
        }
    }

    pub fn items(&self) -> &[StagedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stage a selection of files. Unsupported types and duplicates are
    /// rejected per file; every accepted item gets its own preview handle.
    pub fn stage_files(&mut self, files: Vec<IncomingFile>) -> StagingReport {
        let mut report = StagingReport::default();

        for file in files {
            let file_name = file
                .path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();

            let extension = file
                .path
                .extension()
                .map(|ext| ext.to_string_lossy().to_string())
                .unwrap_or_default();

            let Some(kind) = MediaKind::from_extension(&extension) else {
                tracing::info!("Rejecting {}: unsupported extension .{}", file_name, extension);
                report.rejected.push(RejectedFile {
                    file_name,
                    reason: StagingError::UnsupportedType { extension },
                });
                continue;
            };

            if self.items.iter().any(|item| item.source.path == file.path) {
                tracing::info!("Rejecting {}: already staged", file_name);
                report.rejected.push(RejectedFile {
                    file_name,
                    reason: StagingError::DuplicateSource,
                });
                continue;
            }

            let preview_path = match self.preview_ops.allocate(&file.path) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("Preview allocation failed for {}: {}", file_name, e);
                    report.rejected.push(RejectedFile {
                        file_name,
                        reason: StagingError::PreviewAllocation(e.to_string()),
                    });
                    continue;
                }
            };

            let source = SourceFile {
                path: file.path,
                file_name,
                size_bytes: file.size_bytes,
                kind,
            };
            let preview = PreviewHandle::new(preview_path, self.preview_ops.clone());
            self.items.push(StagedItem::new(source, preview));
            report.accepted.push(self.items.len() - 1);
        }

        report
    }

    /// Merge a partial draft edit into an item. Any edit clears the
    /// item's validated mark.
    pub fn update_draft(&mut self, index: usize, patch: DraftPatch) -> Result<(), Error> {
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| Error::InvalidInput(format!("No staged item at index {}", index)))?;

        if let Some(title) = patch.title {
            item.draft.title = title;
        }
        if let Some(description) = patch.description {
            item.draft.description = description;
        }
        if let Some(tags) = patch.tags {
            item.draft.tags = tags;
        }
        if let Some(access_scope) = patch.access_scope {
            item.draft.access_scope = access_scope;
        }
        if let Some(organization_ids) = patch.organization_ids {
            item.draft.organization_ids = organization_ids;
        }
        item.validated = false;
        Ok(())
    }

    /// Remove an item from the queue. The item's preview handle is
    /// released when the item drops.
    pub fn remove_item(&mut self, index: usize) -> Result<(), Error> {
        if index >= self.items.len() {
            return Err(Error::InvalidInput(format!(
                "No staged item at index {}",
                index
            )));
        }
        self.items.remove(index);
        Ok(())
    }

    /// Validate every queued draft. Items that pass are marked validated;
    /// the returned list holds the issues of those that did not.
    pub fn validate_all(&mut self) -> Vec<(usize, Vec<ValidationIssue>)> {
        let mut failed = Vec::new();
        for (index, item) in self.items.iter_mut().enumerate() {
            let issues = validate_draft(&item.draft);
            if issues.is_empty() {
                item.validated = true;
            } else {
                item.validated = false;
                failed.push((index, issues));
            }
        }
        failed
    }

    /// Hand the whole queue over to a run. Fails without side effects
    /// while any item has validation issues; on success the stager is
    /// left empty, so queue edits mid-run are impossible.
    pub fn take_batch(&mut self, parent: Option<ParentLink>) -> Result<UploadBatch, Error> {
        let issues = self.validate_all();
        if !issues.is_empty() {
            return Err(Error::Validation(issues));
        }
        Ok(UploadBatch {
            items: std::mem::take(&mut self.items),
            parent,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use core_types::AccessScope;

    use super::*;
    use crate::staging::preview::mock::MockPreviewOps;

    fn incoming(path: &str) -> IncomingFile {
        IncomingFile {
            path: PathBuf::from(path),
            size_bytes: 1024,
        }
    }

    fn stager_with_mock() -> (AssetStager, Arc<MockPreviewOps>) {
        let preview_ops = Arc::new(MockPreviewOps::new());
        (AssetStager::new_with_ops(preview_ops.clone()), preview_ops)
    }

    #[test]
    fn test_stage_files_accepts_supported_files() {
        let (mut stager, preview_ops) = stager_with_mock();

        let report = stager.stage_files(vec![
            incoming("/media/briefing.mp4"),
            incoming("/media/poster.png"),
        ]);

        assert_eq!(report.accepted, vec![0, 1]);
        assert!(report.rejected.is_empty());
        assert_eq!(stager.len(), 2);
        assert_eq!(preview_ops.allocated_count(), 2);
        // title defaults to the file stem
        assert_eq!(stager.items()[0].draft.title, "briefing");
        assert_eq!(stager.items()[0].source.kind, MediaKind::Video);
    }

    #[test]
    fn test_stage_files_rejects_unsupported_and_duplicate() {
        let (mut stager, _) = stager_with_mock();
        stager.stage_files(vec![incoming("/media/briefing.mp4")]);

        let report = stager.stage_files(vec![
            incoming("/media/notes.xyz"),
            incoming("/media/briefing.mp4"),
        ]);

        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(
            report.rejected[0].reason,
            StagingError::UnsupportedType {
                extension: "xyz".to_string()
            }
        );
        assert_eq!(report.rejected[1].reason, StagingError::DuplicateSource);
        assert_eq!(stager.len(), 1);
    }

    #[test]
    fn test_preview_allocation_failure_rejects_file() {
        let (mut stager, preview_ops) = stager_with_mock();
        preview_ops.fail_allocate();

        let report = stager.stage_files(vec![incoming("/media/briefing.mp4")]);

        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert!(matches!(
            report.rejected[0].reason,
            StagingError::PreviewAllocation(_)
        ));
        assert!(stager.is_empty());
    }

    #[test]
    fn test_remove_item_releases_preview() {
        let (mut stager, preview_ops) = stager_with_mock();
        stager.stage_files(vec![incoming("/media/briefing.mp4")]);
        assert_eq!(preview_ops.active_count(), 1);

        stager.remove_item(0).unwrap();

        assert!(stager.is_empty());
        assert_eq!(preview_ops.active_count(), 0);
    }

    #[test]
    fn test_update_draft_merges_and_clears_validated_mark() {
        let (mut stager, _) = stager_with_mock();
        stager.stage_files(vec![incoming("/media/briefing.mp4")]);

        assert!(stager.validate_all().is_empty());
        assert!(stager.items()[0].validated);

        stager
            .update_draft(
                0,
                DraftPatch {
                    description: Some("Walkthrough".to_string()),
                    access_scope: Some(AccessScope::Public),
                    ..Default::default()
                },
            )
            .unwrap();

        let item = &stager.items()[0];
        assert!(!item.validated);
        // untouched fields survive the merge
        assert_eq!(item.draft.title, "briefing");
        assert_eq!(item.draft.description, "Walkthrough");
        assert_eq!(item.draft.access_scope, AccessScope::Public);
    }

    #[test]
    fn test_take_batch_fails_with_validation_issues_and_keeps_items() {
        let (mut stager, _) = stager_with_mock();
        stager.stage_files(vec![incoming("/media/briefing.mp4")]);
        stager
            .update_draft(
                0,
                DraftPatch {
                    title: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();

        let result = stager.take_batch(None);

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(stager.len(), 1);
    }

    #[test]
    fn test_take_batch_empties_the_stager() {
        let (mut stager, _) = stager_with_mock();
        stager.stage_files(vec![incoming("/media/briefing.mp4")]);

        let batch = stager.take_batch(None).unwrap();

        assert_eq!(batch.items.len(), 1);
        assert!(stager.is_empty());
    }
}
