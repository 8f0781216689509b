use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Pipeline failures keep the engine's message untouched.
    #[error(transparent)]
    Engine(#[from] finisher_engine::Error),

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("Invalid arguments: {0}")]
    Arguments(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Collapse a possibly multi-line message onto one line.
///
/// Supervisors read a single `ERROR:` line from stdout; tool diagnostics
/// often span several.
pub fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}
