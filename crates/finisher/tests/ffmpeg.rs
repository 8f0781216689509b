//! Tests against a real ffmpeg/ffprobe installation.
//!
//! Run with `cargo test -p finisher-engine --test ffmpeg -- --ignored`.

use std::path::{Path, PathBuf};

use finisher_engine::{
    CancellationToken, FfmpegTool, FinisherConfig, FinishingPipeline, MediaTool, PipelineRequest,
};
use tempfile::TempDir;

/// Encode a `secs`-long test pattern clip with a silent audio track.
fn make_chunk(dir: &Path, name: &str, secs: u32) -> PathBuf {
    let path = dir.join(name);
    let status = std::process::Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={secs}:size=320x240:rate=25"))
        .args(["-f", "lavfi", "-i"])
        .arg(format!("anullsrc=r=44100:cl=mono:d={secs}"))
        .args(["-shortest", "-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac"])
        .arg(&path)
        .status()
        .expect("ffmpeg not available");
    assert!(status.success());
    path
}

fn setup(durations: &[u32]) -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let chunks = temp_dir.path().join("chunks");
    std::fs::create_dir(&chunks).unwrap();
    for (i, secs) in durations.iter().enumerate() {
        make_chunk(&chunks, &format!("chunk_{i:03}.mp4"), *secs);
    }
    let output = temp_dir.path().join("out").join("final.mp4");
    (temp_dir, chunks, output)
}

fn pipeline() -> FinishingPipeline<FfmpegTool> {
    let config = FinisherConfig::default();
    FinishingPipeline::new(FfmpegTool::from_config(&config), config)
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe"]
async fn test_stitched_duration_is_sum_of_chunks() {
    let (_temp_dir, chunks, output) = setup(&[1, 2, 1]);
    let pipeline = pipeline();
    let cancel = CancellationToken::new();
    let request = PipelineRequest::builder(&chunks, &output).build().unwrap();

    let outcome = pipeline.run(&request, &cancel).await.unwrap();

    let duration = pipeline
        .tool()
        .probe_duration(&outcome.video, &cancel)
        .await
        .unwrap();
    assert!((duration - 4.0).abs() < 0.15, "duration was {duration}");
    assert!(outcome.thumbnail.exists());
    assert!(outcome.metadata.exists());
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe"]
async fn test_effects_on_real_clip() {
    let (_temp_dir, chunks, output) = setup(&[2, 2]);
    let pipeline = pipeline();
    let request = PipelineRequest::builder(&chunks, &output)
        .effects(true)
        .build()
        .unwrap();

    let outcome = pipeline
        .run(&request, &CancellationToken::new())
        .await
        .unwrap();

    let files: Vec<_> = std::fs::read_dir(output.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 3, "unexpected files: {files:?}");
    assert!(outcome.video.exists());
}
