//! Error types for the companion client.

use thiserror::Error;

/// Errors from the REST client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status
    #[error("Server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The request never got an answer (DNS, refused, timeout)
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The answer could not be decoded
    #[error("Unexpected response: {0}")]
    Decode(#[source] reqwest::Error),

    /// The configured base URL is not usable
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Whether the failure means the device is (or looks) offline.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from the companion stores and controllers.
#[derive(Debug, Error)]
pub enum CompanionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt stored state: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

pub type CompanionResult<T> = Result<T, CompanionError>;
