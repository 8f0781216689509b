//! Configuration loading for the CLI.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, the
//! `FFMPEG_PATH`/`FFPROBE_PATH` environment variables, command-line flags.

use std::path::Path;

use finisher_engine::FinisherConfig;
use tracing::debug;

use crate::cli::Args;
use crate::error::{AppError, Result};

/// Parse a TOML configuration document.
pub fn parse_config(raw: &str, origin: &Path) -> Result<FinisherConfig> {
    toml::from_str(raw).map_err(|e| AppError::ConfigParse {
        path: origin.display().to_string(),
        message: e.to_string(),
    })
}

/// Load the configuration file (if any) and apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<FinisherConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
                path: path.display().to_string(),
                source,
            })?;
            debug!(path = %path.display(), "Loaded config file");
            parse_config(&raw, path)?
        }
        None => FinisherConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Apply command-line overrides and validate the result.
pub fn apply_args(mut config: FinisherConfig, args: &Args) -> Result<FinisherConfig> {
    if let Some(ffmpeg) = &args.ffmpeg {
        config.ffmpeg_path = ffmpeg.clone();
    }
    if let Some(ffprobe) = &args.ffprobe {
        config.ffprobe_path = ffprobe.clone();
    }
    if let Some(timeout) = args.timeout {
        config.tool_timeout_secs = Some(timeout);
    }
    config.validate()?;
    Ok(config)
}
