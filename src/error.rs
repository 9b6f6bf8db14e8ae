// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Network request failed: {0}")]
    TransportMiddleware(#[from] reqwest_middleware::Error),
    #[error("Request failed with status {status}: {message}")]
    Request { message: String, status: u16 },
    #[error("Could not parse the API response from '{endpoint}': {source}")]
    ApiParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Download failed: {0}")]
    Download(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to persist temporary file: {0}")]
    TempFilePersist(#[from] tempfile::PersistError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Interrupted by user")]
    UserInterrupt,
    #[error("{0}")] // the message is already user-facing
    UserInputError(String),
    #[error("Unknown error: {0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status carried by the error, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Request { status, .. } => Some(*status),
            AppError::Transport(e) => e.status().map(|s| s.as_u16()),
            AppError::TransportMiddleware(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
