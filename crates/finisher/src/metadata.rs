//! Metadata sidecar written at the end of a successful run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::request::Resolution;
use crate::{Error, Result};

/// Operation name recorded in every sidecar.
pub const OPERATION_NAME: &str = "chunk_management";

/// Structured record of one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub operation: String,
    /// Number of chunks discovered and stitched.
    pub input_chunks: usize,
    /// Paths are recorded lossily: the sidecar is JSON and must be writable
    /// for any path the run itself accepted.
    pub input_directory: String,
    /// The output path exactly as requested.
    pub output_file: String,
    pub thumbnail: String,
    pub resolution: Resolution,
    /// UTC, RFC 3339 / ISO-8601.
    pub processed_at: DateTime<Utc>,
    /// Chunk file names in playback order.
    #[serde(default)]
    pub chunks: Vec<String>,
    #[serde(default)]
    pub effects_applied: bool,
    #[serde(default)]
    pub audio_track: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    /// Duration of the stitched video, when it was probed.
    #[serde(default)]
    pub duration_secs: Option<f64>,
}

impl MetadataRecord {
    /// Start a record stamped with the current UTC time.
    pub fn new(
        input_chunks: usize,
        input_directory: &Path,
        output_file: &Path,
        thumbnail: &Path,
        resolution: Resolution,
    ) -> Self {
        Self {
            operation: OPERATION_NAME.to_string(),
            input_chunks,
            input_directory: display_path(input_directory),
            output_file: display_path(output_file),
            thumbnail: display_path(thumbnail),
            resolution,
            processed_at: Utc::now(),
            chunks: Vec::new(),
            effects_applied: false,
            audio_track: None,
            run_id: None,
            duration_secs: None,
        }
    }
}

/// Path as recorded in the sidecar; invalid UTF-8 becomes U+FFFD.
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Serializes [`MetadataRecord`]s to disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataWriter;

impl MetadataWriter {
    /// Write `record` as pretty JSON to `path`, replacing any previous file.
    pub async fn write(&self, record: &MetadataRecord, path: &Path) -> Result<PathBuf> {
        let mut json = serde_json::to_string_pretty(record)?;
        json.push('\n');

        tokio::fs::write(path, json)
            .await
            .map_err(|e| Error::io_at(path, e))?;

        info!(path = %path.display(), "Metadata written");
        Ok(path.to_path_buf())
    }

    /// Read a sidecar back.
    pub async fn read(&self, path: &Path) -> Result<MetadataRecord> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_at(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}
