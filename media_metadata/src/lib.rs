use std::path::PathBuf;

pub mod media_metadata_ops;

pub use media_metadata_ops::{MediaMetadataOps, StdMediaMetadataOps};

#[derive(Debug, thiserror::Error)]
pub enum MediaMetadataError {
    #[error("Extraction not supported for {0} media")]
    Unsupported(core_types::MediaKind),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Probe error: {0}")]
    Probe(String),
}

/// Result of probing a media file. Every field is optional; whatever the
/// probe could not determine stays empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedMedia {
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail: Option<PathBuf>,
}
