use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArkangelError {
    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("Video not found: {path}")]
    VideoNotFound { path: PathBuf },

    #[error("Could not open video {path}: {reason}")]
    VideoOpenFailed { path: PathBuf, reason: String },

    #[error("Could not start {program}: {reason}")]
    ToolFailed { program: String, reason: String },

    #[error("Moderation service returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Moderation service rejected the video: {reason}")]
    ModerationFailed { reason: String },

    #[error("Cached analysis {path} is unreadable: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

/// Coarse failure classes, used by the CLI to pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Decode,
    Io,
}

impl ArkangelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArkangelError::MissingApiKey { .. } => ErrorKind::Configuration,
            ArkangelError::VideoNotFound { .. }
            | ArkangelError::VideoOpenFailed { .. }
            | ArkangelError::ToolFailed { .. } => ErrorKind::Decode,
            ArkangelError::UnexpectedStatus { .. }
            | ArkangelError::ModerationFailed { .. }
            | ArkangelError::JsonError(_)
            | ArkangelError::ApiError(_) => ErrorKind::Transport,
            ArkangelError::CacheCorrupt { .. } | ArkangelError::IoError(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArkangelError>;
