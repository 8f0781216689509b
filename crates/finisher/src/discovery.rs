//! Chunk discovery.
//!
//! Lexicographic filename order is the only signal of playback order, so
//! producers must name chunks accordingly (e.g. `chunk_0001.mp4`).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{Error, Result};

/// Ordered, non-empty list of chunk files in playback order.
///
/// Duplicates are kept as found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSet {
    chunks: Vec<PathBuf>,
}

impl ChunkSet {
    /// Build a chunk set from already-ordered paths.
    pub fn new(chunks: Vec<PathBuf>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::no_chunks());
        }
        Ok(Self { chunks })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.chunks
    }

    /// The lone chunk, if the set has exactly one member.
    pub fn single(&self) -> Option<&Path> {
        match self.chunks.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// File names in playback order.
    pub fn file_names(&self) -> Vec<String> {
        self.chunks
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.to_string_lossy().into_owned())
            })
            .collect()
    }
}

/// Check whether `path` has one of `extensions` (case-insensitive, no dot).
pub fn has_video_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

fn listing_failed(input_dir: &Path, e: std::io::Error) -> Error {
    Error::Discovery(format!(
        "Cannot read input directory {}: {}",
        input_dir.display(),
        e
    ))
}

/// Scan `input_dir` for chunk files.
///
/// Only regular files (or symlinks to them) whose extension is allowed are
/// kept. The result is sorted by file name in ascending byte order.
pub async fn discover_chunks(input_dir: &Path, extensions: &[String]) -> Result<ChunkSet> {
    let mut entries = tokio::fs::read_dir(input_dir)
        .await
        .map_err(|e| listing_failed(input_dir, e))?;

    let mut found: Vec<(OsString, PathBuf)> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| listing_failed(input_dir, e))?
    {
        let path = entry.path();
        if !has_video_extension(&path, extensions) {
            continue;
        }
        // Follows symlinks; a dangling link is skipped like any non-file.
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => found.push((entry.file_name(), path)),
            Ok(_) => debug!(path = %path.display(), "Skipping non-file entry"),
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable entry"),
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    let chunks: Vec<PathBuf> = found.into_iter().map(|(_, path)| path).collect();

    info!(
        input_dir = %input_dir.display(),
        chunks = chunks.len(),
        "Found {} video chunks",
        chunks.len()
    );

    ChunkSet::new(chunks)
}
