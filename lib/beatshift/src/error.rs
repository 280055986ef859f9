use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Library source unavailable at {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Unauthorized: access token rejected")]
    Unauthorized,

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt failed: {0}")]
    Prompt(String),
}

pub type Result<T> = std::result::Result<T, Error>;
