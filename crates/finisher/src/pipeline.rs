//! The finishing pipeline.
//!
//! A strictly linear state machine:
//!
//! ```text
//! Discover → PrepareOutput → Stitch → (Effects?) → (AudioMux | Promote) → Thumbnail
//!   → WriteMetadata → Done
//! ```
//!
//! Any stage failure aborts every later stage. Each intermediate file is held
//! by a [`StageArtifact`] guard, so nothing but the final triad (video,
//! thumbnail, metadata) outlives the run, whichever way it ends.

use std::path::{Path, PathBuf};

use strum::{AsRefStr, Display};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

use crate::artifact::StageArtifact;
use crate::config::FinisherConfig;
use crate::discovery::{ChunkSet, discover_chunks};
use crate::media::{self, MediaOperation, MediaTool, build_filter_graph};
use crate::metadata::{MetadataRecord, MetadataWriter, display_path};
use crate::naming::{ArtifactNamer, RunId, StageTag};
use crate::request::PipelineRequest;
use crate::{Error, Result};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Discover,
    PrepareOutput,
    Stitch,
    Effects,
    AudioMux,
    Promote,
    Thumbnail,
    WriteMetadata,
}

/// Paths produced by a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Final video, at exactly the requested output path.
    pub video: PathBuf,
    pub thumbnail: PathBuf,
    pub metadata: PathBuf,
    pub chunk_count: usize,
    pub run_id: RunId,
}

/// Sequences discovery, stitching, effects, audio mux, thumbnail and metadata.
pub struct FinishingPipeline<T> {
    tool: T,
    config: FinisherConfig,
    writer: MetadataWriter,
}

impl<T: MediaTool> FinishingPipeline<T> {
    pub fn new(tool: T, config: FinisherConfig) -> Self {
        Self {
            tool,
            config,
            writer: MetadataWriter,
        }
    }

    pub fn config(&self) -> &FinisherConfig {
        &self.config
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Run the pipeline once with a fresh run identifier.
    pub async fn run(
        &self,
        request: &PipelineRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome> {
        self.run_with_id(request, RunId::generate(), cancel).await
    }

    /// Run the pipeline once, naming intermediates after `run_id`.
    pub async fn run_with_id(
        &self,
        request: &PipelineRequest,
        run_id: RunId,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome> {
        let span = info_span!(
            "finish",
            run_id = %run_id,
            output = %request.output_path().display()
        );
        self.run_stages(request, run_id, cancel)
            .instrument(span)
            .await
    }

    async fn run_stages(
        &self,
        request: &PipelineRequest,
        run_id: RunId,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome> {
        info!(
            input_dir = %request.input_dir().display(),
            "Starting chunk finishing"
        );

        let namer = ArtifactNamer::new(request.output_path(), run_id);
        self.check_outputs_distinct(&namer)?;

        let chunks = discover_chunks(request.input_dir(), &self.config.video_extensions)
            .await
            .inspect_err(|e| stage_failed(Stage::Discover, request.input_dir(), e))?;

        prepare_output_dir(namer.output())
            .await
            .inspect_err(|e| stage_failed(Stage::PrepareOutput, namer.output(), e))?;

        let stitched = self.stitch(&chunks, &namer, cancel).await?;

        let (latest, duration_secs, effects_applied) = if request.apply_effects() {
            self.apply_effects(stitched, &namer, cancel).await?
        } else {
            (stitched, None, false)
        };

        let video = match request.audio_path() {
            Some(audio) => self.mux_audio(latest, audio, namer.output(), cancel).await?,
            None => promote(latest, namer.output()).await?,
        };

        let thumbnail = self.thumbnail(&video, &namer, cancel).await?;

        let mut record = MetadataRecord::new(
            chunks.len(),
            request.input_dir(),
            request.output_path(),
            &thumbnail,
            request.resolution(),
        );
        record.chunks = chunks.file_names();
        record.effects_applied = effects_applied;
        record.audio_track = request.audio_path().map(display_path);
        record.run_id = Some(namer.run_id().to_string());
        record.duration_secs = duration_secs;

        let metadata_path = namer.metadata();
        let metadata = self
            .writer
            .write(&record, &metadata_path)
            .await
            .inspect_err(|e| stage_failed(Stage::WriteMetadata, &metadata_path, e))?;

        info!(
            video = %video.display(),
            thumbnail = %thumbnail.display(),
            metadata = %metadata.display(),
            "Chunk finishing completed"
        );

        Ok(PipelineOutcome {
            video,
            thumbnail,
            metadata,
            chunk_count: chunks.len(),
            run_id: namer.run_id().clone(),
        })
    }

    /// The thumbnail and sidecar are siblings of the final video; neither may
    /// land on the video itself (e.g. `final.jpg` with a `jpg` thumbnail).
    fn check_outputs_distinct(&self, namer: &ArtifactNamer) -> Result<()> {
        let output = namer.output();
        let siblings = [
            namer.thumbnail(&self.config.thumbnail.extension),
            namer.metadata(),
        ];
        match siblings.iter().find(|p| same_file_name(p, output)) {
            Some(clash) => Err(Error::invalid_request(format!(
                "output path {} collides with derived artifact {}",
                output.display(),
                clash.display()
            ))),
            None => Ok(()),
        }
    }

    async fn stitch(
        &self,
        chunks: &ChunkSet,
        namer: &ArtifactNamer,
        cancel: &CancellationToken,
    ) -> Result<StageArtifact> {
        let stitched = StageArtifact::new(namer.intermediate(StageTag::Stitched), "stitched");
        info!(
            stage = %Stage::Stitch,
            chunks = chunks.len(),
            artifact = %stitched.path().display(),
            "Stitching chunks"
        );

        media::stitch(
            &self.tool,
            chunks,
            stitched.path(),
            &namer.intermediate(StageTag::Concat),
            cancel,
        )
        .await
        .inspect_err(|e| stage_failed(Stage::Stitch, stitched.path(), e))?;

        Ok(stitched)
    }

    /// Fade the stitched video in and out.
    ///
    /// Returns the newest artifact, the probed duration and whether a filter
    /// was actually applied.
    async fn apply_effects(
        &self,
        stitched: StageArtifact,
        namer: &ArtifactNamer,
        cancel: &CancellationToken,
    ) -> Result<(StageArtifact, Option<f64>, bool)> {
        let duration = self
            .tool
            .probe_duration(stitched.path(), cancel)
            .await
            .inspect_err(|e| stage_failed(Stage::Effects, stitched.path(), e))?;

        let Some(filter_graph) = build_filter_graph(&self.config.effects, duration) else {
            info!(stage = %Stage::Effects, "All fades disabled, skipping effects");
            return Ok((stitched, Some(duration), false));
        };

        let effects = StageArtifact::new(namer.intermediate(StageTag::Effects), "effects");
        info!(
            stage = %Stage::Effects,
            duration,
            filter = %filter_graph,
            artifact = %effects.path().display(),
            "Applying effects"
        );

        let op = MediaOperation::ApplyFilter {
            input: stitched.path().to_path_buf(),
            output: effects.path().to_path_buf(),
            filter_graph,
        };
        self.tool
            .execute(&op, cancel)
            .await
            .inspect_err(|e| stage_failed(Stage::Effects, effects.path(), e))?;

        stitched
            .discard()
            .await
            .inspect_err(|e| stage_failed(Stage::Effects, namer.output(), e))?;

        Ok((effects, Some(duration), true))
    }

    /// Mux `audio` next to the video of `latest`, writing the final path directly.
    async fn mux_audio(
        &self,
        latest: StageArtifact,
        audio: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        // Guards the final path: a failed mux must not leave a file there.
        let target = StageArtifact::new(output, "final output");
        info!(
            stage = %Stage::AudioMux,
            audio = %audio.display(),
            source = %latest.path().display(),
            "Adding audio track"
        );

        let op = MediaOperation::MuxAudio {
            video: latest.path().to_path_buf(),
            audio: audio.to_path_buf(),
            output: output.to_path_buf(),
            codec: self.config.audio.codec.clone(),
            bitrate: self.config.audio.bitrate.clone(),
        };
        self.tool
            .execute(&op, cancel)
            .await
            .inspect_err(|e| stage_failed(Stage::AudioMux, output, e))?;

        latest
            .discard()
            .await
            .inspect_err(|e| stage_failed(Stage::AudioMux, output, e))?;

        Ok(target.keep())
    }

    async fn thumbnail(
        &self,
        video: &Path,
        namer: &ArtifactNamer,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let thumbnail = StageArtifact::new(
            namer.thumbnail(&self.config.thumbnail.extension),
            "thumbnail",
        );
        info!(
            stage = %Stage::Thumbnail,
            offset_secs = self.config.thumbnail.offset_secs,
            artifact = %thumbnail.path().display(),
            "Generating thumbnail"
        );

        let op = MediaOperation::ExtractFrame {
            input: video.to_path_buf(),
            output: thumbnail.path().to_path_buf(),
            offset_secs: self.config.thumbnail.offset_secs,
        };
        self.tool
            .execute(&op, cancel)
            .await
            .inspect_err(|e| stage_failed(Stage::Thumbnail, thumbnail.path(), e))?;

        // The tool exits 0 without writing a frame when the offset is past the end.
        ensure_written(thumbnail.path(), op.name())
            .await
            .inspect_err(|e| stage_failed(Stage::Thumbnail, thumbnail.path(), e))?;

        Ok(thumbnail.keep())
    }
}

/// Rename the newest intermediate to the final path. No re-encode.
async fn promote(latest: StageArtifact, output: &Path) -> Result<PathBuf> {
    info!(
        stage = %Stage::Promote,
        source = %latest.path().display(),
        "No audio track, promoting {} output",
        latest.label()
    );
    latest
        .promote(output)
        .await
        .inspect_err(|e| stage_failed(Stage::Promote, output, e))
}

async fn prepare_output_dir(output: &Path) -> Result<()> {
    match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::io_at(dir, e)),
        _ => Ok(()),
    }
}

/// Compare paths the way a case-insensitive filesystem would.
fn same_file_name(a: &Path, b: &Path) -> bool {
    a == b
        || (a.parent() == b.parent()
            && a.file_name()
                .zip(b.file_name())
                .is_some_and(|(x, y)| x.eq_ignore_ascii_case(y)))
}

async fn ensure_written(path: &Path, operation: &'static str) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(Error::Transcode {
            operation,
            status: Some(0),
            stderr: format!("no output written to {}", path.display()),
        }),
    }
}

fn stage_failed(stage: Stage, artifact: &Path, err: &Error) {
    error!(
        stage = %stage,
        artifact = %artifact.display(),
        "Stage failed: {}",
        err
    );
}
