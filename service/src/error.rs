use std::fmt::{Display, Formatter, Result};

use crate::staging::validate::ValidationIssue;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Draft validation failed; nothing was started. Carries the issues
    /// per staged item index.
    Validation(Vec<(usize, Vec<ValidationIssue>)>),
    /// A processing stage failed for one item. Fatal to the item, never
    /// to the run.
    Stage { stage: &'static str, message: String },
    /// Dependent discovery failed. The store is untouched; safe to retry.
    Discovery(String),
    /// A batched delete commit failed. Batches committed before the
    /// failure are not rolled back, so a retry needs reconciliation.
    Commit {
        message: String,
        batches_committed: usize,
    },
    /// Failure of an external transport or store call.
    External(String),
    OperationCancelled,
    InvalidInput(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Error::Validation(issues) => {
                let item_count = issues.len();
                write!(f, "Validation failed for {} staged item(s)", item_count)
            }
            Error::Stage { stage, message } => {
                write!(f, "Upload stage '{}' failed: {}", stage, message)
            }
            Error::Discovery(message) => write!(f, "Dependent discovery failed: {}", message),
            Error::Commit {
                message,
                batches_committed,
            } => write!(
                f,
                "Delete commit failed after {} committed batch(es): {}",
                batches_committed, message
            ),
            Error::External(message) => write!(f, "External service error: {}", message),
            Error::OperationCancelled => write!(f, "Operation was cancelled"),
            Error::InvalidInput(message) => write!(f, "Invalid input: {}", message),
        }
    }
}

impl From<media_store::BlobStorageError> for Error {
    fn from(err: media_store::BlobStorageError) -> Self {
        Error::External(err.to_string())
    }
}

impl From<media_metadata::MediaMetadataError> for Error {
    fn from(err: media_metadata::MediaMetadataError) -> Self {
        Error::External(err.to_string())
    }
}

impl From<document_store::StoreError> for Error {
    fn from(err: document_store::StoreError) -> Self {
        Error::External(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::External(format!("IO error: {}", err))
    }
}
