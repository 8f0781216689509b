//! Pipeline request value object.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Target resolution label. Recorded in the metadata sidecar only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
pub enum Resolution {
    #[serde(rename = "720p")]
    #[strum(serialize = "720p")]
    P720,
    #[default]
    #[serde(rename = "1080p")]
    #[strum(serialize = "1080p")]
    P1080,
}

/// One invocation of the finishing pipeline.
///
/// Built once through [`PipelineRequest::builder`] and never mutated.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    input_dir: PathBuf,
    output_path: PathBuf,
    audio_path: Option<PathBuf>,
    apply_effects: bool,
    resolution: Resolution,
}

impl PipelineRequest {
    pub fn builder(
        input_dir: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> PipelineRequestBuilder {
        PipelineRequestBuilder {
            input_dir: input_dir.into(),
            output_path: output_path.into(),
            audio_path: None,
            apply_effects: false,
            resolution: Resolution::default(),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn audio_path(&self) -> Option<&Path> {
        self.audio_path.as_deref()
    }

    pub fn apply_effects(&self) -> bool {
        self.apply_effects
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Builder for [`PipelineRequest`].
#[derive(Debug)]
pub struct PipelineRequestBuilder {
    input_dir: PathBuf,
    output_path: PathBuf,
    audio_path: Option<PathBuf>,
    apply_effects: bool,
    resolution: Resolution,
}

impl PipelineRequestBuilder {
    pub fn audio(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.audio_path = path.map(Into::into);
        self
    }

    pub fn effects(mut self, apply: bool) -> Self {
        self.apply_effects = apply;
        self
    }

    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Validate and freeze the request.
    ///
    /// The output path needs a file name and an extension because the media
    /// tool picks the container from it.
    pub fn build(self) -> Result<PipelineRequest> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(Error::invalid_request("input directory must not be empty"));
        }
        if self.output_path.file_stem().is_none() {
            return Err(Error::invalid_request(format!(
                "output path has no file name: {}",
                self.output_path.display()
            )));
        }
        if self.output_path.extension().is_none() {
            return Err(Error::invalid_request(format!(
                "output path needs a container extension: {}",
                self.output_path.display()
            )));
        }
        if let Some(audio) = &self.audio_path
            && !audio.is_file()
        {
            return Err(Error::invalid_request(format!(
                "audio track not found: {}",
                audio.display()
            )));
        }

        Ok(PipelineRequest {
            input_dir: self.input_dir,
            output_path: self.output_path,
            audio_path: self.audio_path,
            apply_effects: self.apply_effects,
            resolution: self.resolution,
        })
    }
}
