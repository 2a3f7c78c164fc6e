//! Error types for the CLI

use std::path::PathBuf;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Status(#[from] kstatus_common::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {what}: {message}")]
    InvalidInput { what: String, message: String },
}

impl From<kstatus_common::ValidationError> for Error {
    fn from(err: kstatus_common::ValidationError) -> Self {
        Error::Status(err.into())
    }
}

impl Error {
    pub fn invalid_input(what: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            what: what.into(),
            message: message.into(),
        }
    }
}
