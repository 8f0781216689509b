//! # Finisher Engine
//!
//! Assembles a deliverable video from pre-produced chunks: discovers the
//! chunks, stitches them losslessly, optionally fades the result and muxes an
//! audio track, grabs a thumbnail and records a JSON metadata sidecar.
//!
//! All transcoding goes through the [`MediaTool`] trait; [`FfmpegTool`] is the
//! command-line implementation.
//!
//! ## Usage
//!
//! ```no_run
//! use finisher_engine::{FfmpegTool, FinisherConfig, FinishingPipeline, PipelineRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> finisher_engine::Result<()> {
//! let config = FinisherConfig::default();
//! let pipeline = FinishingPipeline::new(FfmpegTool::from_config(&config), config);
//! let request = PipelineRequest::builder("chunks/", "out/final.mp4")
//!     .effects(true)
//!     .build()?;
//! let outcome = pipeline.run(&request, &CancellationToken::new()).await?;
//! println!("{}", outcome.video.display());
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod config;
pub mod discovery;
pub mod error;
pub mod media;
pub mod metadata;
pub mod naming;
pub mod pipeline;
pub mod request;

pub use artifact::StageArtifact;
pub use config::{AudioConfig, EffectsConfig, FinisherConfig, ThumbnailConfig};
pub use discovery::{ChunkSet, discover_chunks};
pub use error::{Error, NO_CHUNKS_MESSAGE, Result};
pub use media::{FfmpegTool, MediaOperation, MediaTool};
pub use metadata::{MetadataRecord, MetadataWriter, OPERATION_NAME};
pub use naming::{ArtifactNamer, RunId, StageTag};
pub use pipeline::{FinishingPipeline, PipelineOutcome, Stage};
pub use request::{PipelineRequest, PipelineRequestBuilder, Resolution};
pub use tokio_util::sync::CancellationToken;
