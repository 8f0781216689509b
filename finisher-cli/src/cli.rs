use clap::Parser;
use finisher_engine::Resolution;
use std::path::PathBuf;

/// Assemble a final video from pre-produced chunks.
///
/// Chunks are joined in lexicographic file name order, so name them with
/// zero-padded sequence numbers.
#[derive(Parser, Debug)]
#[command(name = "finisher", version, about, long_about = None)]
pub struct Args {
    /// Directory holding the video chunks
    #[arg(long = "input-dir", visible_alias = "input_dir", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Final output video path
    #[arg(long = "output-path", visible_alias = "output_path", value_name = "FILE")]
    pub output_path: PathBuf,

    /// Audio track to mux into the final output
    #[arg(long = "add-audio", visible_alias = "add_audio", value_name = "FILE")]
    pub add_audio: Option<PathBuf>,

    /// Apply fade-in/fade-out effects
    #[arg(long = "add-effects", visible_alias = "add_effects")]
    pub add_effects: bool,

    /// Target resolution label (recorded in the metadata sidecar)
    #[arg(long, default_value = "1080p", value_name = "720p|1080p")]
    pub resolution: Resolution,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "FINISHER_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Kill a tool invocation that runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to the ffmpeg binary
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<String>,

    /// Path to the ffprobe binary
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<String>,

    /// Enable verbose (debug) logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from([
            "finisher",
            "--input-dir",
            "chunks",
            "--output-path",
            "out/final.mp4",
        ])
        .unwrap();
        assert_eq!(args.input_dir, PathBuf::from("chunks"));
        assert!(args.add_audio.is_none());
        assert!(!args.add_effects);
        assert_eq!(args.resolution, Resolution::P1080);
        assert!(args.timeout.is_none());
    }

    #[test]
    fn test_underscore_aliases() {
        let args = Args::try_parse_from([
            "finisher",
            "--input_dir",
            "chunks",
            "--output_path",
            "final.mp4",
            "--add_audio",
            "track.mp3",
            "--add_effects",
            "--resolution",
            "720p",
        ])
        .unwrap();
        assert_eq!(args.add_audio, Some(PathBuf::from("track.mp3")));
        assert!(args.add_effects);
        assert_eq!(args.resolution, Resolution::P720);
    }

    #[test]
    fn test_rejects_unknown_resolution() {
        let result = Args::try_parse_from([
            "finisher",
            "--input-dir",
            "c",
            "--output-path",
            "o.mp4",
            "--resolution",
            "4k",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_requires_input_and_output() {
        assert!(Args::try_parse_from(["finisher", "--input-dir", "c"]).is_err());
    }
}
