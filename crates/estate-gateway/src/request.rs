//! Request and response values exchanged with a [`crate::Transport`]

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::outcome::{ApiOutcome, Failure};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_query_pairs<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.query.extend(pairs);
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: ErrorMessage,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// `message` field of a JSON error body, if the server sent one.
    pub fn error_message(&self) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(&self.body).ok()?;
        let message = match parsed.message {
            ErrorMessage::One(message) => message,
            ErrorMessage::Many(messages) => messages.join("; "),
        };
        let message = message.trim().to_string();
        (!message.is_empty()).then_some(message)
    }

    /// Classify the response and decode a successful body as `T`.
    pub fn outcome<T: DeserializeOwned>(&self) -> ApiOutcome<T> {
        self.classify(|body| {
            serde_json::from_str(body).map_err(|e| e.to_string())
        })
    }

    /// Classify the response, ignoring any successful body.
    pub fn outcome_unit(&self) -> ApiOutcome<()> {
        self.classify(|_| Ok(()))
    }

    fn classify<T, F>(&self, decode: F) -> ApiOutcome<T>
    where
        F: FnOnce(&str) -> Result<T, String>,
    {
        if self.is_success() {
            return match decode(&self.body) {
                Ok(value) => ApiOutcome::Ok(value),
                Err(reason) => ApiOutcome::OtherError(Failure::Malformed {
                    status: self.status,
                    reason,
                }),
            };
        }

        if self.is_unauthorized() {
            return ApiOutcome::AuthError(self.status);
        }

        let message = self.error_message().unwrap_or_else(|| {
            self.status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
        ApiOutcome::OtherError(Failure::Status {
            status: self.status,
            message,
        })
    }
}
