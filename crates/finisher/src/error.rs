//! Engine-wide error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Engine-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Message reported when the input directory holds no eligible chunks.
pub const NO_CHUNKS_MESSAGE: &str = "No video chunks found in input directory";

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// No eligible chunks, or the input location could not be listed.
    #[error("{0}")]
    Discovery(String),

    /// The media tool exited with a non-zero status.
    #[error("{operation} failed: {stderr}")]
    Transcode {
        operation: &'static str,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} timed out after {}s", timeout.as_secs())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn no_chunks() -> Self {
        Self::Discovery(NO_CHUNKS_MESSAGE.to_string())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Wrap an I/O failure on `path` so the message names the file involved.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        Self::Io(std::io::Error::new(
            source.kind(),
            format!("{}: {}", path.display(), source),
        ))
    }

    /// True for failures reported by, or while driving, the media tool.
    pub fn is_transcode(&self) -> bool {
        matches!(
            self,
            Self::Transcode { .. }
                | Self::Spawn { .. }
                | Self::Timeout { .. }
                | Self::Cancelled { .. }
                | Self::Probe(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_chunks_message_is_literal() {
        assert_eq!(
            Error::no_chunks().to_string(),
            "No video chunks found in input directory"
        );
    }

    #[test]
    fn test_transcode_keeps_stderr_verbatim() {
        let err = Error::Transcode {
            operation: "audio mux",
            status: Some(1),
            stderr: "line one\nline two: Invalid data".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "audio mux failed: line one\nline two: Invalid data"
        );
        assert!(err.is_transcode());
    }

    #[test]
    fn test_io_at_names_path() {
        let err = Error::io_at(
            "/tmp/out.mp4",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/tmp/out.mp4"));
        assert!(!err.is_transcode());
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout {
            operation: "stitch",
            timeout: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "stitch timed out after 90s");
    }
}
