//! Media tool invocation.
//!
//! [`MediaTool`] is the seam between the pipeline and the external
//! transcoder: every call blocks the stage until the tool exits and reports
//! a non-zero exit as [`Error::Transcode`](crate::Error::Transcode) carrying
//! the tool's diagnostics.

mod concat;
mod effects;
mod ffmpeg;
mod operation;

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::Result;

pub use concat::{create_concat_manifest, make_absolute, stitch};
pub use effects::{build_filter_graph, fade_out_start};
pub use ffmpeg::{FfmpegTool, ToolOutput, parse_duration, run_tool};
pub use operation::{MediaOperation, format_timestamp};

/// External media tool.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Run one operation to completion.
    ///
    /// # Cancel Safety
    ///
    /// Implementations must not leave the tool running when the future is
    /// dropped or `cancel` fires. Removing a partially written output is the
    /// caller's job.
    async fn execute(&self, operation: &MediaOperation, cancel: &CancellationToken) -> Result<()>;

    /// Container duration of `path` in seconds.
    async fn probe_duration(&self, path: &Path, cancel: &CancellationToken) -> Result<f64>;
}
