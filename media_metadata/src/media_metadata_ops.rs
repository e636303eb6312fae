use std::path::Path;

use core_types::MediaKind;

use crate::{ExtractedMedia, MediaMetadataError};

const THUMBNAIL_WIDTH: u32 = 320;
const THUMBNAIL_HEIGHT: u32 = 180;

/// Trait for derived-metadata extraction to enable testing.
///
/// Extraction is an opaque external operation; callers must treat failure
/// as non-fatal and proceed without derived metadata.
pub trait MediaMetadataOps: Send + Sync {
    fn extract(&self, path: &Path, kind: MediaKind) -> Result<ExtractedMedia, MediaMetadataError>;
}

/// Standard implementation. Probes dimensions and renders a thumbnail for
/// still images; other media kinds report `Unsupported` and rely on the
/// platform's transcoding backend to fill derived fields later.
pub struct StdMediaMetadataOps;

impl MediaMetadataOps for StdMediaMetadataOps {
    fn extract(&self, path: &Path, kind: MediaKind) -> Result<ExtractedMedia, MediaMetadataError> {
        if kind != MediaKind::Image {
            return Err(MediaMetadataError::Unsupported(kind));
        }

        let image = image::open(path)?;
        let width = image.width();
        let height = image.height();

        let thumbnail = image.thumbnail(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT);
        let thumbnail_path = tempfile::Builder::new()
            .prefix("asset-thumb-")
            .suffix(".png")
            .tempfile()?
            .into_temp_path()
            .keep()
            .map_err(|e| MediaMetadataError::Probe(format!("Failed to keep thumbnail: {e}")))?;
        thumbnail.save(&thumbnail_path)?;

        Ok(ExtractedMedia {
            duration_secs: None,
            width: Some(width),
            height: Some(height),
            thumbnail: Some(thumbnail_path),
        })
    }
}

pub mod mock {
    use std::collections::{HashMap, HashSet};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use core_types::MediaKind;

    use crate::{ExtractedMedia, MediaMetadataError};

    use super::MediaMetadataOps;

    #[derive(Default)]
    struct MockState {
        extracted: HashMap<PathBuf, ExtractedMedia>,
        fail_paths: HashSet<PathBuf>,
    }

    /// Mock implementation of MediaMetadataOps for testing
    #[derive(Clone, Default)]
    pub struct MockMediaMetadataOps {
        state: Arc<Mutex<MockState>>,
    }

    impl MockMediaMetadataOps {
        pub fn new() -> Self {
            Self::default()
        }

        /// Preset the extraction result for a path
        pub fn add_extracted(&self, path: impl Into<PathBuf>, extracted: ExtractedMedia) {
            let mut state = self.state.lock().unwrap();
            state.extracted.insert(path.into(), extracted);
        }

        /// Make extraction fail for a path
        pub fn fail_for(&self, path: impl Into<PathBuf>) {
            let mut state = self.state.lock().unwrap();
            state.fail_paths.insert(path.into());
        }
    }

    impl MediaMetadataOps for MockMediaMetadataOps {
        fn extract(
            &self,
            path: &Path,
            _kind: MediaKind,
        ) -> Result<ExtractedMedia, MediaMetadataError> {
            let state = self.state.lock().unwrap();
            if state.fail_paths.contains(path) {
                return Err(MediaMetadataError::Probe(format!(
                    "Mock extraction failure for path: {}",
                    path.display()
                )));
            }
            Ok(state.extracted.get(path).cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::mock::MockMediaMetadataOps;
    use super::*;

    #[test]
    fn test_std_extraction_reports_unsupported_for_video() {
        let ops = StdMediaMetadataOps;
        let result = ops.extract(Path::new("/media/clip.mp4"), MediaKind::Video);
        assert!(matches!(result, Err(MediaMetadataError::Unsupported(_))));
    }

    #[test]
    fn test_mock_returns_preset_result() {
        let ops = MockMediaMetadataOps::new();
        ops.add_extracted(
            "/media/poster.png",
            ExtractedMedia {
                width: Some(640),
                height: Some(480),
                thumbnail: Some(PathBuf::from("/tmp/thumb.png")),
                ..Default::default()
            },
        );

        let extracted = ops
            .extract(Path::new("/media/poster.png"), MediaKind::Image)
            .unwrap();
        assert_eq!(extracted.width, Some(640));
        assert_eq!(extracted.thumbnail, Some(PathBuf::from("/tmp/thumb.png")));
    }

    #[test]
    fn test_mock_failure_injection() {
        let ops = MockMediaMetadataOps::new();
        ops.fail_for("/media/poster.png");

        let result = ops.extract(Path::new("/media/poster.png"), MediaKind::Image);
        assert!(result.is_err());
    }
}
