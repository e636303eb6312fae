use std::fmt::{Display, Formatter, Result};
use std::path::PathBuf;

use core_types::{AccessScope, DerivedMetadata, DraftMetadata, RecordId, SourceFile};

use crate::staging::preview::PreviewHandle;
use crate::upload::model::ItemStage;

/// A file handed to the stager, before kind resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StagingError {
    UnsupportedType { extension: String },
    DuplicateSource,
    PreviewAllocation(String),
}

impl Display for StagingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            StagingError::UnsupportedType { extension } => {
                write!(f, "Unsupported file type: .{}", extension)
            }
            StagingError::DuplicateSource => write!(f, "File is already staged"),
            StagingError::PreviewAllocation(message) => {
                write!(f, "Failed to allocate preview: {}", message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedFile {
    pub file_name: String,
    pub reason: StagingError,
}

/// Outcome of one stage_files call: indices of newly staged items plus
/// per-file rejections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StagingReport {
    pub accepted: Vec<usize>,
    pub rejected: Vec<RejectedFile>,
}

/// Partial draft update; only present fields are merged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub access_scope: Option<AccessScope>,
    pub organization_ids: Option<Vec<RecordId>>,
}

/// One queued item awaiting upload. Owned by the stager before a run and
/// by the run exclusively afterwards; addressed by stable queue index.
#[derive(Debug)]
pub struct StagedItem {
    pub source: SourceFile,
    pub draft: DraftMetadata,
    pub derived: DerivedMetadata,
    pub stage: ItemStage,
    pub progress_percent: u8,
    pub message: String,
    pub preview: PreviewHandle,
    /// Cleared by any draft edit; set again by validate_all.
    pub validated: bool,
}

impl StagedItem {
    pub fn new(source: SourceFile, preview: PreviewHandle) -> Self {
        // Default the title to the file stem so a quick upload needs no typing
        let title = source
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            source,
            draft: DraftMetadata {
                title,
                ..Default::default()
            },
            derived: DerivedMetadata::default(),
            stage: ItemStage::Idle,
            progress_percent: 0,
            message: String::new(),
            preview,
            validated: false,
        }
    }
}
