/// Unified error types for the Box feed core
use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for feed operations
#[derive(Error, Debug)]
pub enum FeedError {
    /// Request never produced a response (connect, timeout, DNS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server answered with a non-2xx status
    #[error("Server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Response decoded but did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// No credential available, or the server rejected it
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Target post does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client-side input rejected before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure taxonomy used when surfacing errors to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable or non-2xx status
    Transport,
    /// Anything the server or client considered semantically wrong
    Logical,
}

impl FeedError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FeedError::Transport(_) | FeedError::Status { .. } => FailureKind::Transport,
            _ => FailureKind::Logical,
        }
    }

    /// Whether re-arming the driver and trying again can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Transport(_) => true,
            FeedError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Short label used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            FeedError::Transport(_) => "transport",
            FeedError::Status { .. } => "status",
            FeedError::Malformed(_) => "malformed",
            FeedError::Authentication(_) => "authentication",
            FeedError::NotFound(_) => "not_found",
            FeedError::Validation(_) => "validation",
            FeedError::Configuration(_) => "configuration",
            FeedError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FeedError::Malformed(e.to_string())
        } else {
            FeedError::Transport(e.to_string())
        }
    }
}

/// Result type alias for feed operations
pub type FeedResult<T> = Result<T, FeedError>;
