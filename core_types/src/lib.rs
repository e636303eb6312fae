use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

pub mod events;

/// Identifier of a record in the managed document store.
pub type RecordId = String;

#[derive(Debug, Clone, PartialEq, Eq, Copy, EnumIter, Display, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Document,
}

impl MediaKind {
    /// Prefix under which blobs of this kind are stored.
    pub fn storage_prefix(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
            MediaKind::Document => "document",
        }
    }

    /// Resolve a media kind from a file extension. Extensions outside the
    /// supported set are rejected at staging time.
    pub fn from_extension(extension: &str) -> Option<MediaKind> {
        match extension.to_ascii_lowercase().as_str() {
            "mp4" | "mov" | "webm" | "mkv" => Some(MediaKind::Video),
            "mp3" | "wav" | "m4a" | "flac" => Some(MediaKind::Audio),
            "png" | "jpg" | "jpeg" | "webp" | "gif" => Some(MediaKind::Image),
            "pdf" => Some(MediaKind::Document),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, EnumIter, Display, Serialize, Deserialize)]
pub enum AccessScope {
    #[default]
    #[strum(serialize = "All Organizations")]
    AllOrganizations,
    Public,
    Restricted,
}

/// User-entered metadata for an asset awaiting upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub access_scope: AccessScope,
    /// Organizations the asset is limited to when the scope is `Restricted`.
    pub organization_ids: Vec<RecordId>,
}

/// Metadata derived from the media itself. All fields are best-effort:
/// extraction failure leaves them empty and the asset is still usable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedMetadata {
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail: Option<PathBuf>,
}

/// A file selected for staging, resolved to a supported media kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub kind: MediaKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("MP4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("jpeg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("pdf"), Some(MediaKind::Document));
        assert_eq!(MediaKind::from_extension("exe"), None);
    }

    #[test]
    fn test_storage_prefix() {
        assert_eq!(MediaKind::Video.storage_prefix(), "video");
        assert_eq!(MediaKind::Document.storage_prefix(), "document");
    }
}
