use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Uploaded video bytes parked on disk for the decoder.
///
/// Removed on [`TempVideoFile::release`], or on drop if never released.
#[derive(Debug)]
pub struct TempVideoFile {
    path: PathBuf,
    released: bool,
}

impl TempVideoFile {
    pub async fn create(bytes: &[u8]) -> std::io::Result<Self> {
        Self::create_in(&std::env::temp_dir(), bytes).await
    }

    pub async fn create_in(dir: &Path, bytes: &[u8]) -> std::io::Result<Self> {
        let path = dir.join(format!("framescribe-{}.video", Uuid::new_v4()));
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Wrote temporary video file");
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    error = %err,
                    path = %self.path.display(),
                    "Failed to remove temporary video file"
                );
            }
        }
    }
}

impl Drop for TempVideoFile {
    fn drop(&mut self) {
        self.release();
    }
}
