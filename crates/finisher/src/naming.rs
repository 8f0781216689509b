//! Artifact path derivation.
//!
//! Pure functions only: nothing here touches the filesystem. The pipeline
//! owns creation and deletion of the paths computed here.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use strum::{AsRefStr, Display};

/// Short token identifying one pipeline run.
///
/// Embedded in intermediate names so concurrent runs targeting the same
/// output never share an intermediate file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self(id)
    }

    /// Use a caller-chosen token (tests, resumable supervisors).
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Intermediate artifact kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StageTag {
    /// Concatenated chunks, before effects or audio.
    Stitched,
    /// Stitched video with the fade filter graph applied.
    Effects,
    /// Manifest handed to the concat demuxer.
    Concat,
}

impl StageTag {
    /// Extension override; `None` keeps the final output's extension.
    fn extension(self) -> Option<&'static str> {
        match self {
            Self::Concat => Some("txt"),
            Self::Stitched | Self::Effects => None,
        }
    }
}

/// Derives every path a run touches from the requested output path.
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    output: PathBuf,
    run_id: RunId,
}

impl ArtifactNamer {
    pub fn new(output: impl Into<PathBuf>, run_id: RunId) -> Self {
        Self {
            output: output.into(),
            run_id,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// The final video path, exactly as requested.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// `<dir>/<stem>_<tag>_<run>.<ext>`
    pub fn intermediate(&self, tag: StageTag) -> PathBuf {
        let ext = tag
            .extension()
            .map(OsStr::new)
            .or_else(|| self.output.extension());
        let name = format!("{}_{}_{}", self.stem(), tag.as_ref(), self.run_id);
        self.sibling(name, ext)
    }

    /// `<dir>/<stem>.<image_ext>`
    pub fn thumbnail(&self, image_ext: &str) -> PathBuf {
        self.sibling(
            self.stem().into_owned(),
            Some(OsStr::new(image_ext.trim_start_matches('.'))),
        )
    }

    /// `<dir>/<stem>_metadata.json`
    pub fn metadata(&self) -> PathBuf {
        self.sibling(format!("{}_metadata", self.stem()), Some(OsStr::new("json")))
    }

    fn stem(&self) -> std::borrow::Cow<'_, str> {
        self.output
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_else(|| "output".into())
    }

    fn sibling(&self, name: String, ext: Option<&OsStr>) -> PathBuf {
        let mut file_name = std::ffi::OsString::from(name);
        if let Some(ext) = ext {
            file_name.push(".");
            file_name.push(ext);
        }
        self.output.with_file_name(file_name)
    }
}
