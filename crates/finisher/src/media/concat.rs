//! Lossless chunk concatenation.
//!
//! A single chunk is stream-copied straight to the target. Several chunks go
//! through ffmpeg's concat demuxer (`-f concat`) with `-c copy`, so the result
//! is a remux with zero quality loss. The manifest the demuxer reads is a
//! stage artifact and is removed whether the concat succeeds or not.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{MediaOperation, MediaTool};
use crate::artifact::StageArtifact;
use crate::discovery::ChunkSet;
use crate::{Error, Result};

/// Resolve `path` against the current directory if it is relative.
///
/// The concat demuxer resolves relative entries against the manifest's own
/// directory, not the caller's working directory.
pub fn make_absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Ok(abs) = std::fs::canonicalize(path) {
        return abs;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Raw bytes of `path`. Unix paths need not be UTF-8 and are passed through as is.
#[cfg(unix)]
fn path_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

/// Append `path` to `out` single-quoted, with `'` escaped as `'\''`.
fn push_quoted(out: &mut Vec<u8>, path: &Path) {
    out.push(b'\'');
    for byte in path_bytes(path) {
        if byte == b'\'' {
            out.extend_from_slice(br"'\''");
        } else {
            out.push(byte);
        }
    }
    out.push(b'\'');
}

/// Build manifest bytes: one `file '<path>'` line per chunk, in order.
pub fn create_concat_manifest(segments: &[PathBuf]) -> Vec<u8> {
    let mut manifest = Vec::new();
    for segment in segments {
        manifest.extend_from_slice(b"file ");
        push_quoted(&mut manifest, &make_absolute(segment));
        manifest.push(b'\n');
    }
    manifest
}

/// Join `chunks` into `output`.
///
/// `list_path` is where the manifest goes when more than one chunk is
/// present; it never survives this call.
pub async fn stitch<T>(
    tool: &T,
    chunks: &ChunkSet,
    output: &Path,
    list_path: &Path,
    cancel: &CancellationToken,
) -> Result<()>
where
    T: MediaTool + ?Sized,
{
    if let Some(only) = chunks.single() {
        info!(chunk = %only.display(), "Single chunk, stream copying");
        let op = MediaOperation::StreamCopy {
            input: only.to_path_buf(),
            output: output.to_path_buf(),
        };
        return tool.execute(&op, cancel).await;
    }

    let manifest = StageArtifact::new(list_path, "concat list");
    tokio::fs::write(manifest.path(), create_concat_manifest(chunks.paths()))
        .await
        .map_err(|e| Error::io_at(manifest.path(), e))?;
    debug!(
        manifest = %manifest.path().display(),
        segments = chunks.len(),
        "Concat manifest written"
    );

    let op = MediaOperation::Concat {
        list: manifest.path().to_path_buf(),
        output: output.to_path_buf(),
    };
    let result = tool.execute(&op, cancel).await;

    // Removed on both paths; a failed removal only matters if the join worked.
    let cleanup = manifest.discard().await;
    result?;
    cleanup?;

    info!(
        segments = chunks.len(),
        output = %output.display(),
        "Stitched chunks"
    );
    Ok(())
}
