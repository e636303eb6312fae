use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Trait for preview handle allocation to enable testing.
///
/// A preview handle is the temporary resource a staged item holds so the
/// console can render the file before upload. Each handle belongs to
/// exactly one item.
pub trait PreviewOps: Send + Sync {
    /// Allocate a preview resource for the given source file.
    fn allocate(&self, source: &Path) -> Result<PathBuf, std::io::Error>;

    /// Release a previously allocated preview resource.
    fn release(&self, handle: &Path) -> Result<(), std::io::Error>;
}

pub struct StdPreviewOps;

impl PreviewOps for StdPreviewOps {
    fn allocate(&self, source: &Path) -> Result<PathBuf, std::io::Error> {
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let path = std::env::temp_dir().join(format!("preview-{}-{}", uuid::Uuid::new_v4(), file_name));
        std::fs::File::create(&path)?;
        Ok(path)
    }

    fn release(&self, handle: &Path) -> Result<(), std::io::Error> {
        if handle.exists() {
            std::fs::remove_file(handle)?;
        }
        Ok(())
    }
}

/// Owned preview resource, released exactly once on every exit path.
///
/// Release happens on drop at the latest; callers may release earlier
/// when an item reaches a terminal stage.
pub struct PreviewHandle {
    path: PathBuf,
    ops: Arc<dyn PreviewOps>,
    released: bool,
}

impl PreviewHandle {
    pub fn new(path: PathBuf, ops: Arc<dyn PreviewOps>) -> Self {
        Self {
            path,
            ops,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.ops.release(&self.path) {
            tracing::warn!(
                "Failed to release preview handle {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("path", &self.path)
            .field("released", &self.released)
            .finish()
    }
}

pub mod mock {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use super::PreviewOps;

    #[derive(Default)]
    struct MockState {
        next_handle: u64,
        allocated: Vec<PathBuf>,
        released: Vec<PathBuf>,
        fail_allocate: bool,
    }

    /// Mock implementation of PreviewOps for testing
    #[derive(Clone, Default)]
    pub struct MockPreviewOps {
        state: Arc<Mutex<MockState>>,
    }

    impl MockPreviewOps {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_allocate(&self) {
            let mut state = self.state.lock().unwrap();
            state.fail_allocate = true;
        }

        pub fn allocated_count(&self) -> usize {
            let state = self.state.lock().unwrap();
            state.allocated.len()
        }

        pub fn released_count(&self) -> usize {
            let state = self.state.lock().unwrap();
            state.released.len()
        }

        /// Handles allocated but not yet released.
        pub fn active_count(&self) -> usize {
            let state = self.state.lock().unwrap();
            state.allocated.len() - state.released.len()
        }

        pub fn was_released(&self, handle: &Path) -> bool {
            let state = self.state.lock().unwrap();
            state.released.iter().any(|p| p == handle)
        }
    }

    impl PreviewOps for MockPreviewOps {
        fn allocate(&self, source: &Path) -> Result<PathBuf, std::io::Error> {
            let mut state = self.state.lock().unwrap();
            if state.fail_allocate {
                return Err(std::io::Error::other("Mock preview allocation failure"));
            }
            state.next_handle += 1;
            let file_name = source
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "unnamed".to_string());
            let path = PathBuf::from(format!(
                "/mock/previews/{}-{}",
                state.next_handle, file_name
            ));
            state.allocated.push(path.clone());
            Ok(path)
        }

        fn release(&self, handle: &Path) -> Result<(), std::io::Error> {
            let mut state = self.state.lock().unwrap();
            state.released.push(handle.to_path_buf());
            Ok(())
        }
    }
}
