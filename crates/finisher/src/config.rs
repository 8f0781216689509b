//! Engine configuration.
//!
//! Every field has a default so a partial TOML table (or none at all) yields
//! a usable configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for the finishing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinisherConfig {
    /// Path to the ffmpeg binary.
    pub ffmpeg_path: String,
    /// Path to the ffprobe binary.
    pub ffprobe_path: String,
    /// Deadline for a single tool invocation. `None` waits indefinitely.
    pub tool_timeout_secs: Option<u64>,
    /// Container extensions accepted as chunks (without the dot).
    pub video_extensions: Vec<String>,
    pub effects: EffectsConfig,
    pub thumbnail: ThumbnailConfig,
    pub audio: AudioConfig,
}

impl Default for FinisherConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            tool_timeout_secs: None,
            video_extensions: default_video_extensions(),
            effects: EffectsConfig::default(),
            thumbnail: ThumbnailConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

fn default_video_extensions() -> Vec<String> {
    ["mp4", "avi", "mov", "mkv", "wmv"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl FinisherConfig {
    /// Apply `FFMPEG_PATH` / `FFPROBE_PATH` from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("FFMPEG_PATH")
            && !path.trim().is_empty()
        {
            self.ffmpeg_path = path;
        }
        if let Ok(path) = std::env::var("FFPROBE_PATH")
            && !path.trim().is_empty()
        {
            self.ffprobe_path = path;
        }
        self
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.ffmpeg_path.trim().is_empty() {
            return Err(Error::config("ffmpeg_path must not be empty"));
        }
        if self.ffprobe_path.trim().is_empty() {
            return Err(Error::config("ffprobe_path must not be empty"));
        }
        if self.video_extensions.is_empty() {
            return Err(Error::config("video_extensions must list at least one extension"));
        }
        if self.tool_timeout_secs == Some(0) {
            return Err(Error::config("tool_timeout_secs must be greater than zero"));
        }
        self.effects.validate()?;
        self.thumbnail.validate()?;
        if self.audio.codec.trim().is_empty() {
            return Err(Error::config("audio.codec must not be empty"));
        }
        Ok(())
    }
}

/// Fade settings for the effects stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Fade-in length from time zero, in seconds. Zero disables it.
    pub fade_in_secs: f64,
    /// Fade-out length ending at the clip's end, in seconds. Zero disables it.
    pub fade_out_secs: f64,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            fade_in_secs: 1.0,
            fade_out_secs: 1.0,
        }
    }
}

impl EffectsConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("effects.fade_in_secs", self.fade_in_secs),
            ("effects.fade_out_secs", self.fade_out_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for thumbnail extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Offset into the final video to grab the frame from (in seconds).
    pub offset_secs: f64,
    /// Image extension; the tool picks the encoder from it.
    pub extension: String,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            offset_secs: 1.0,
            extension: "jpg".to_string(),
        }
    }
}

impl ThumbnailConfig {
    fn validate(&self) -> Result<()> {
        if !self.offset_secs.is_finite() || self.offset_secs < 0.0 {
            return Err(Error::config(format!(
                "thumbnail.offset_secs must be a non-negative number, got {}",
                self.offset_secs
            )));
        }
        let ext = self.extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\']) {
            return Err(Error::config(format!(
                "thumbnail.extension is not a valid extension: {:?}",
                self.extension
            )));
        }
        Ok(())
    }
}

/// Audio track settings for the mux stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Encoder the audio track is re-encoded with.
    pub codec: String,
    /// Optional bitrate (e.g. "192k").
    pub bitrate: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            codec: "aac".to_string(),
            bitrate: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = FinisherConfig::default();
        assert_eq!(config.ffmpeg_path, "ffmpeg");
        assert_eq!(config.video_extensions.len(), 5);
        assert_eq!(config.effects.fade_in_secs, 1.0);
        assert_eq!(config.thumbnail.offset_secs, 1.0);
        assert_eq!(config.thumbnail.extension, "jpg");
        assert_eq!(config.audio.codec, "aac");
        assert!(config.tool_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_parse() {
        let json = r#"{"tool_timeout_secs": 600, "effects": {"fade_out_secs": 2.5}}"#;
        let config: FinisherConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.effects.fade_out_secs, 2.5);
        assert_eq!(config.effects.fade_in_secs, 1.0); // default
        assert_eq!(config.ffprobe_path, "ffprobe"); // default
    }

    #[test]
    fn test_validate_rejects_negative_fade() {
        let mut config = FinisherConfig::default();
        config.effects.fade_in_secs = -1.0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = FinisherConfig {
            tool_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_extensions() {
        let config = FinisherConfig {
            video_extensions: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
