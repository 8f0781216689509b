//! ffmpeg/ffprobe backed [`MediaTool`].

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use process_utils::kill_process_group;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{MediaOperation, MediaTool};
use crate::{Error, FinisherConfig, Result};

/// Captured result of one finished tool process.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: f64,
}

/// Runs operations through the ffmpeg command line tools.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Option<Duration>,
}

impl FfmpegTool {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &FinisherConfig) -> Self {
        Self::new(&config.ffmpeg_path, &config.ffprobe_path).with_timeout(config.tool_timeout())
    }

    /// Bound every invocation by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn execute(&self, operation: &MediaOperation, cancel: &CancellationToken) -> Result<()> {
        let args = operation.ffmpeg_args();
        info!(
            operation = operation.name(),
            output = %operation.output().display(),
            "Running ffmpeg"
        );
        debug!("FFmpeg args: {:?}", args);

        let output = run_tool(
            &self.ffmpeg_path,
            &args,
            operation.name(),
            self.timeout,
            cancel,
        )
        .await?;

        if !output.status.success() {
            error!(
                operation = operation.name(),
                code = ?output.status.code(),
                "ffmpeg failed: {}",
                output.stderr.trim_end()
            );
            return Err(Error::Transcode {
                operation: operation.name(),
                status: output.status.code(),
                stderr: output.stderr,
            });
        }

        info!(
            operation = operation.name(),
            "ffmpeg finished in {:.2}s",
            output.duration
        );
        Ok(())
    }

    async fn probe_duration(&self, path: &Path, cancel: &CancellationToken) -> Result<f64> {
        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(path.into());

        let output = run_tool(&self.ffprobe_path, &args, "probe", self.timeout, cancel).await?;
        if !output.status.success() {
            return Err(Error::Probe(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                output.stderr.trim_end()
            )));
        }

        let duration = parse_duration(&output.stdout).ok_or_else(|| {
            Error::Probe(format!(
                "ffprobe reported no duration for {}: {:?}",
                path.display(),
                output.stdout.trim()
            ))
        })?;
        debug!(path = %path.display(), duration, "Probed duration");
        Ok(duration)
    }
}

/// Parse ffprobe's bare `format=duration` output.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

enum Exit {
    Finished(std::io::Result<ExitStatus>),
    TimedOut(Duration),
    Cancelled,
}

/// Spawn `program` in its own process group and wait for it.
///
/// Both output streams are captured in full. If `timeout` elapses or
/// `cancel` fires first, the whole process group is killed and reaped
/// before the error is returned.
pub async fn run_tool(
    program: &str,
    args: &[OsString],
    operation: &'static str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<ToolOutput> {
    let start = Instant::now();

    let mut command = process_utils::tokio_group_command(program);
    command
        .args(args)
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| Error::Spawn {
        program: program.to_string(),
        source,
    })?;

    let stdout = child.stdout.take().map(|s| spawn_capture(s, "stdout"));
    let stderr = child.stderr.take().map(|s| spawn_capture(s, "stderr"));

    let deadline = async {
        match timeout {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                limit
            }
            None => std::future::pending().await,
        }
    };

    let exit = tokio::select! {
        status = child.wait() => Exit::Finished(status),
        limit = deadline => Exit::TimedOut(limit),
        _ = cancel.cancelled() => Exit::Cancelled,
    };

    let status = match exit {
        Exit::Finished(status) => status?,
        Exit::TimedOut(limit) => {
            warn!(operation, "{} did not finish within {}s, killing it", program, limit.as_secs());
            terminate(&mut child).await;
            abort_capture(stdout);
            abort_capture(stderr);
            return Err(Error::Timeout {
                operation,
                timeout: limit,
            });
        }
        Exit::Cancelled => {
            warn!(operation, "Cancellation requested, killing {}", program);
            terminate(&mut child).await;
            abort_capture(stdout);
            abort_capture(stderr);
            return Err(Error::Cancelled { operation });
        }
    };

    Ok(ToolOutput {
        status,
        stdout: join_capture(stdout).await,
        stderr: join_capture(stderr).await,
        duration: start.elapsed().as_secs_f64(),
    })
}

fn spawn_capture<R>(reader: R, stream: &'static str) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = reader;
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf).await {
            debug!(stream, error = %e, "Stopped reading tool output");
        }
        let text = String::from_utf8_lossy(&buf).into_owned();
        for line in text.lines() {
            debug!("{}: {}", stream, line);
        }
        text
    })
}

async fn join_capture(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

fn abort_capture(handle: Option<JoinHandle<String>>) {
    if let Some(handle) = handle {
        handle.abort();
    }
}

/// Kill the child's process group (falling back to the child alone) and reap it.
async fn terminate(child: &mut Child) {
    if let Some(pid) = child.id()
        && let Err(e) = kill_process_group(pid)
    {
        debug!(pid, error = %e, "Process group kill failed, killing child directly");
        if let Err(e) = child.start_kill() {
            warn!(pid, error = %e, "Failed to kill tool process");
        }
    }
    if let Err(e) = child.wait().await {
        warn!(error = %e, "Failed to reap tool process");
    }
}
