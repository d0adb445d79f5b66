use std::sync::PoisonError;
use std::time::Duration;

use thiserror::Error;

use crate::http::response::Payload;

/// Non-2xx response details carried by [`ClientError::Http`]
#[derive(Debug, Clone)]
pub struct HttpFailure {
    pub status: u16,
    pub status_text: String,
    pub body: Payload,
    /// Human-readable message derived from the status table
    pub message: String,
}

impl HttpFailure {
    /// The `message` field of a JSON error body, if the server sent one
    pub fn server_message(&self) -> Option<&str> {
        self.body.message()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    // Request pipeline errors
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{} ({} {})", .0.message, .0.status, .0.status_text)]
    Http(Box<HttpFailure>),

    #[error("Unknown error: {0}")]
    Unknown(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Session errors
    #[error("Session error: {0}")]
    Session(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used by callers that only branch on the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Network,
    Unauthorized,
    Http,
    Unknown,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::Network,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Http(_) => ErrorKind::Http,
            Self::Unknown(_) | Self::Storage(_) | Self::Session(_) | Self::Config(_) => {
                ErrorKind::Unknown
            }
        }
    }

    /// HTTP status associated with the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(failure) => Some(failure.status),
            Self::Unauthorized(_) => Some(401),
            _ => None,
        }
    }
}

// Converting from PoisonError to facilitate poisoned lock handling
impl<T> From<PoisonError<T>> for ClientError {
    fn from(err: PoisonError<T>) -> Self {
        ClientError::Storage(format!("Lock poisoned: {}", err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Unknown(format!("JSON error: {}", err))
    }
}

// Generic result type for the client
pub type Result<T> = std::result::Result<T, ClientError>;
