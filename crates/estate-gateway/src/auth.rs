//! Auth endpoints and the login flow
//!
//! These calls talk to the transport directly. A 401 from the login or
//! refresh endpoint is an answer, not a reason to refresh.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use estate_session::{CredentialPair, SessionStore, User};

use crate::error::AuthError;
use crate::outcome::{ApiOutcome, Failure};
use crate::request::{ApiRequest, ApiResponse};
use crate::transport::Transport;

pub const DEFAULT_LOGIN_FAILURE: &str = "Authorization failed";

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";
pub(crate) const PROFILE_PATH: &str = "/users/profile";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

impl TokenResponse {
    fn into_pair(self) -> Result<CredentialPair, AuthError> {
        let pair = CredentialPair::new(self.access_token, self.refresh_token);
        if pair.is_usable() {
            Ok(pair)
        } else {
            Err(AuthError::UnusableCredentials)
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub user: User,
    pub credentials: CredentialPair,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    user: User,
    #[serde(flatten)]
    tokens: TokenResponse,
}

#[derive(Clone)]
pub struct AuthEndpoints {
    transport: Arc<dyn Transport>,
}

impl AuthEndpoints {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let body = serde_json::to_value(LoginRequest { email, password })
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        let response = self
            .transport
            .execute(&ApiRequest::post(LOGIN_PATH).with_json(body), None)
            .await?;

        if response.status.is_client_error() {
            let message = response
                .error_message()
                .unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_string());
            return Err(AuthError::Rejected(message));
        }

        let body: LoginBody = decode(&response)?;
        Ok(LoginResponse {
            user: body.user,
            credentials: body.tokens.into_pair()?,
        })
    }

    /// Trade a refresh credential for a new pair.
    pub async fn refresh(&self, refresh_credential: &str) -> Result<CredentialPair, AuthError> {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: refresh_credential,
        })
        .map_err(|e| AuthError::Malformed(e.to_string()))?;
        let response = self
            .transport
            .execute(&ApiRequest::post(REFRESH_PATH).with_json(body), None)
            .await?;

        let tokens: TokenResponse = decode(&response)?;
        tokens.into_pair()
    }

    /// Fetch the identity behind an explicit access credential.
    pub async fn profile(&self, access_credential: &str) -> Result<User, AuthError> {
        let response = self
            .transport
            .execute(&ApiRequest::get(PROFILE_PATH), Some(access_credential))
            .await?;

        decode(&response)
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: &ApiResponse) -> Result<T, AuthError> {
    match response.outcome::<T>() {
        ApiOutcome::Ok(value) => Ok(value),
        ApiOutcome::AuthError(status) => Err(AuthError::Status {
            status,
            message: response
                .error_message()
                .unwrap_or_else(|| "Unauthorized".to_string()),
        }),
        ApiOutcome::OtherError(Failure::Status { status, message }) => {
            Err(AuthError::Status { status, message })
        }
        ApiOutcome::OtherError(Failure::Malformed { reason, .. }) => {
            Err(AuthError::Malformed(reason))
        }
    }
}

/// Login and logout against the session store.
#[derive(Clone)]
pub struct Authenticator {
    endpoints: AuthEndpoints,
    store: SessionStore,
}

impl Authenticator {
    pub fn new(endpoints: AuthEndpoints, store: SessionStore) -> Self {
        Self { endpoints, store }
    }

    /// Run a login attempt. On failure the message lands in the session's
    /// `error` and any previous session is kept.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.store.begin_login();

        match self.endpoints.login(email, password).await {
            Ok(LoginResponse { user, credentials }) => {
                tracing::info!(user_id = %user.id, role = %user.role, "Logged in");
                self.store.complete_login(user.clone(), credentials);
                Ok(user)
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.store.fail_login(e.user_message());
                Err(e)
            }
        }
    }

    pub fn logout(&self) {
        self.store.clear();
        tracing::info!("Logged out");
    }
}
