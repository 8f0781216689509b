//! Stage artifact ownership.
//!
//! A [`StageArtifact`] owns a path for the duration of a run. Unless it is
//! promoted or kept, the file is removed when the guard is dropped, which
//! covers the success path, `?` early returns and cancelled futures alike.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Error, Result};

/// Transient file produced by one stage and consumed by the next.
#[derive(Debug)]
pub struct StageArtifact {
    path: PathBuf,
    label: &'static str,
    armed: bool,
}

impl StageArtifact {
    /// Take ownership of `path`. Nothing is created on disk.
    pub fn new(path: impl Into<PathBuf>, label: &'static str) -> Self {
        Self {
            path: path.into(),
            label,
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Delete the artifact now that its consumer has read it.
    pub async fn discard(mut self) -> Result<()> {
        self.armed = false;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(artifact = %self.path.display(), label = self.label, "Removed stage artifact");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io_at(&self.path, e)),
        }
    }

    /// Rename the artifact to `dest`, replacing any file already there.
    ///
    /// On failure the guard stays armed and removes the artifact on drop.
    pub async fn promote(mut self, dest: &Path) -> Result<PathBuf> {
        tokio::fs::rename(&self.path, dest)
            .await
            .map_err(|e| Error::io_at(dest, e))?;
        self.armed = false;
        debug!(
            artifact = %self.path.display(),
            dest = %dest.display(),
            "Promoted stage artifact"
        );
        Ok(dest.to_path_buf())
    }

    /// Release ownership; the file outlives the guard.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for StageArtifact {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(
                artifact = %self.path.display(),
                label = self.label,
                "Cleaned up stage artifact"
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                artifact = %self.path.display(),
                label = self.label,
                error = %e,
                "Failed to clean up stage artifact"
            ),
        }
    }
}
