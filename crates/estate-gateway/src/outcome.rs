//! Tagged results at the gateway boundary

use reqwest::StatusCode;

/// A response classified for downstream code: a decoded payload, an
/// authorization failure the gateway could not resolve, or anything else.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Ok(T),
    AuthError(StatusCode),
    OtherError(Failure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Non-success status other than 401
    Status { status: StatusCode, message: String },
    /// Success status whose body did not decode
    Malformed { status: StatusCode, reason: String },
}

impl Failure {
    pub fn status(&self) -> StatusCode {
        match self {
            Failure::Status { status, .. } | Failure::Malformed { status, .. } => *status,
        }
    }
}
