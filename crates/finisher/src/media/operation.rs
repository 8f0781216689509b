//! Media operations and their ffmpeg argument recipes.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// One media operation the tool can perform.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaOperation {
    /// Re-containerize a single input without re-encoding.
    StreamCopy { input: PathBuf, output: PathBuf },
    /// Join the files listed in a concat manifest without re-encoding.
    Concat { list: PathBuf, output: PathBuf },
    /// Copy the video stream and re-encode an external audio track next to it.
    MuxAudio {
        video: PathBuf,
        audio: PathBuf,
        output: PathBuf,
        codec: String,
        bitrate: Option<String>,
    },
    /// Re-encode the video through a filter graph; audio is copied.
    ApplyFilter {
        input: PathBuf,
        output: PathBuf,
        filter_graph: String,
    },
    /// Grab a single frame as a still image.
    ExtractFrame {
        input: PathBuf,
        output: PathBuf,
        offset_secs: f64,
    },
}

impl MediaOperation {
    /// Short human-readable name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StreamCopy { .. } => "stream copy",
            Self::Concat { .. } => "concat",
            Self::MuxAudio { .. } => "audio mux",
            Self::ApplyFilter { .. } => "effects",
            Self::ExtractFrame { .. } => "thumbnail",
        }
    }

    /// The file this operation writes.
    pub fn output(&self) -> &Path {
        match self {
            Self::StreamCopy { output, .. }
            | Self::Concat { output, .. }
            | Self::MuxAudio { output, .. }
            | Self::ApplyFilter { output, .. }
            | Self::ExtractFrame { output, .. } => output,
        }
    }

    /// Build the ffmpeg argument vector (without the program name).
    pub fn ffmpeg_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
            .into_iter()
            .map(OsString::from)
            .collect();

        match self {
            Self::StreamCopy { input, output } => {
                push_all(&mut args, ["-i"]);
                args.push(input.into());
                push_all(&mut args, ["-c", "copy"]);
                args.push(output.into());
            }
            Self::Concat { list, output } => {
                push_all(&mut args, ["-f", "concat", "-safe", "0", "-i"]);
                args.push(list.into());
                push_all(&mut args, ["-c", "copy"]);
                args.push(output.into());
            }
            Self::MuxAudio {
                video,
                audio,
                output,
                codec,
                bitrate,
            } => {
                push_all(&mut args, ["-i"]);
                args.push(video.into());
                push_all(&mut args, ["-i"]);
                args.push(audio.into());
                push_all(
                    &mut args,
                    ["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a"],
                );
                args.push(codec.into());
                if let Some(bitrate) = bitrate {
                    push_all(&mut args, ["-b:a"]);
                    args.push(bitrate.into());
                }
                args.push(output.into());
            }
            Self::ApplyFilter {
                input,
                output,
                filter_graph,
            } => {
                push_all(&mut args, ["-i"]);
                args.push(input.into());
                push_all(&mut args, ["-vf"]);
                args.push(filter_graph.into());
                push_all(&mut args, ["-c:a", "copy"]);
                args.push(output.into());
            }
            Self::ExtractFrame {
                input,
                output,
                offset_secs,
            } => {
                // Seeking after -i decodes up to the offset, which is exact.
                push_all(&mut args, ["-i"]);
                args.push(input.into());
                push_all(&mut args, ["-ss"]);
                args.push(format_timestamp(*offset_secs).into());
                push_all(&mut args, ["-frames:v", "1"]);
                args.push(output.into());
            }
        }

        args
    }
}

fn push_all<const N: usize>(args: &mut Vec<OsString>, items: [&str; N]) {
    args.extend(items.into_iter().map(OsString::from));
}

/// Format seconds as `HH:MM:SS.mmm`.
pub fn format_timestamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let (hours, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rem) = (rem / 60_000, rem % 60_000);
    let (seconds, millis) = (rem / 1000, rem % 1000);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
