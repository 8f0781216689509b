//! Scripted media tool for driving the pipeline without ffmpeg.
//!
//! Outputs are plain byte strings so tests can tell which stage produced a
//! file: stream copy and concat join input bytes, effects wrap them in
//! `fx(..)`, audio mux appends `+audio`, thumbnails are `jpeg`.

#![allow(dead_code)]

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use finisher_engine::{CancellationToken, Error, MediaOperation, MediaTool, Result};
use tempfile::TempDir;

/// One concat invocation as the tool saw it.
#[derive(Debug, Clone)]
pub struct ConcatCall {
    pub list: PathBuf,
    pub existed: bool,
    pub contents: Vec<u8>,
}

#[derive(Default)]
pub struct ScriptedTool {
    fail_on: Option<&'static str>,
    silent_on: Option<&'static str>,
    duration: f64,
    calls: Mutex<Vec<MediaOperation>>,
    concat_calls: Mutex<Vec<ConcatCall>>,
}

impl ScriptedTool {
    pub fn new() -> Self {
        Self {
            duration: 30.0,
            ..Default::default()
        }
    }

    /// Fail the operation named `operation` (see [`MediaOperation::name`]).
    /// A partial output is written first, like a real encoder would.
    pub fn failing(operation: &'static str) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::new()
        }
    }

    /// Report success for `operation` without writing its output.
    pub fn silent(operation: &'static str) -> Self {
        Self {
            silent_on: Some(operation),
            ..Self::new()
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(|op| op.name()).collect()
    }

    pub fn calls(&self) -> Vec<MediaOperation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn concat_calls(&self) -> Vec<ConcatCall> {
        self.concat_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaTool for ScriptedTool {
    async fn execute(&self, operation: &MediaOperation, cancel: &CancellationToken) -> Result<()> {
        self.calls.lock().unwrap().push(operation.clone());

        if let MediaOperation::Concat { list, .. } = operation {
            let contents = std::fs::read(list).unwrap_or_default();
            self.concat_calls.lock().unwrap().push(ConcatCall {
                list: list.clone(),
                existed: list.exists(),
                contents,
            });
        }

        if cancel.is_cancelled() {
            std::fs::write(operation.output(), b"partial")?;
            return Err(Error::Cancelled {
                operation: operation.name(),
            });
        }

        if self.fail_on == Some(operation.name()) {
            std::fs::write(operation.output(), b"partial")?;
            return Err(Error::Transcode {
                operation: operation.name(),
                status: Some(1),
                stderr: "simulated failure\nInvalid data found when processing input\n"
                    .to_string(),
            });
        }

        if self.silent_on == Some(operation.name()) {
            return Ok(());
        }

        let bytes = match operation {
            MediaOperation::StreamCopy { input, .. } => std::fs::read(input)?,
            MediaOperation::Concat { list, .. } => {
                let mut joined = Vec::new();
                for path in parse_manifest(&std::fs::read(list)?) {
                    joined.extend(std::fs::read(path)?);
                }
                joined
            }
            MediaOperation::ApplyFilter { input, .. } => {
                let mut out = b"fx(".to_vec();
                out.extend(std::fs::read(input)?);
                out.push(b')');
                out
            }
            MediaOperation::MuxAudio { video, .. } => {
                let mut out = std::fs::read(video)?;
                out.extend(b"+audio");
                out
            }
            MediaOperation::ExtractFrame { .. } => b"jpeg".to_vec(),
        };
        std::fs::write(operation.output(), bytes)?;
        Ok(())
    }

    async fn probe_duration(&self, path: &Path, _cancel: &CancellationToken) -> Result<f64> {
        if !path.exists() {
            return Err(Error::Probe(format!("{} does not exist", path.display())));
        }
        Ok(self.duration)
    }
}

/// Parse `file '<path>'` lines back into paths, byte for byte.
pub fn parse_manifest(contents: &[u8]) -> Vec<PathBuf> {
    contents
        .split(|b| *b == b'\n')
        .filter_map(|line| line.strip_prefix(b"file '"))
        .filter_map(|rest| rest.strip_suffix(b"'"))
        .map(|quoted| path_from_bytes(&unescape(quoted)))
        .collect()
}

fn unescape(quoted: &[u8]) -> Vec<u8> {
    let escaped: &[u8] = br"'\''";
    let mut out = Vec::with_capacity(quoted.len());
    let mut rest = quoted;
    while !rest.is_empty() {
        if rest.starts_with(escaped) {
            out.push(b'\'');
            rest = &rest[escaped.len()..];
        } else {
            out.push(rest[0]);
            rest = &rest[1..];
        }
    }
    out
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// A temp workspace with `chunks/` and `out/`.
pub struct Workspace {
    pub dir: TempDir,
    chunks_name: OsString,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_chunks_dir(OsStr::new("chunks"))
    }

    /// Chunk directory whose name is not valid UTF-8.
    #[cfg(unix)]
    pub fn non_utf8() -> Self {
        use std::os::unix::ffi::OsStrExt;
        Self::with_chunks_dir(OsStr::from_bytes(b"chunks_\xff"))
    }

    fn with_chunks_dir(name: &OsStr) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(name)).unwrap();
        Self {
            dir,
            chunks_name: name.to_os_string(),
        }
    }

    pub fn chunks(&self) -> PathBuf {
        self.dir.path().join(&self.chunks_name)
    }

    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn output(&self) -> PathBuf {
        self.out_dir().join("final.mp4")
    }

    pub fn add_chunk(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.chunks().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn add_audio(&self) -> PathBuf {
        let path = self.dir.path().join("track.mp3");
        std::fs::write(&path, b"audio").unwrap();
        path
    }

    /// Sorted file names currently in `out/`.
    pub fn out_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.out_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
