//! API error types

use estate_gateway::{Failure, GatewayError, StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// 401 after the gateway gave up; the session has been cleared
    #[error("Session expired")]
    SessionExpired,

    /// 403; the session is intact
    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed with {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Malformed response ({status}): {reason}")]
    Malformed { status: StatusCode, reason: String },

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ApiError {
    /// Network-level failure; the caller may try again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Gateway(GatewayError::Transport(_)))
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Status { status, message } if status == StatusCode::FORBIDDEN => {
                ApiError::Forbidden(message)
            }
            Failure::Status { status, message } if status == StatusCode::NOT_FOUND => {
                ApiError::NotFound(message)
            }
            Failure::Status { status, message } => ApiError::Status { status, message },
            Failure::Malformed { status, reason } => ApiError::Malformed { status, reason },
        }
    }
}
