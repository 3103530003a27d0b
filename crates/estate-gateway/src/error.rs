//! Gateway error types

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

impl From<url::ParseError> for TransportError {
    fn from(e: url::ParseError) -> Self {
        TransportError::InvalidUrl(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    /// The server refused the supplied email/password
    #[error("{0}")]
    Rejected(String),

    #[error("Server returned no usable credential pair")]
    UnusableCredentials,

    #[error("Auth endpoint returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Malformed auth response: {0}")]
    Malformed(String),

    #[error("Network error: {0}")]
    Transport(#[from] TransportError),
}

impl AuthError {
    /// Message suitable for the inline login error.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
