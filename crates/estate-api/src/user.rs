//! User administration and the signed-in user's profile

use serde::{Deserialize, Serialize};

use estate_gateway::{ApiRequest, Gateway};
use estate_session::{Role, User};

use crate::call::{execute, fetch, segment};
use crate::error::ApiError;
use crate::Result;

const USERS_PATH: &str = "/users";
const PROFILE_PATH: &str = "/users/profile";

pub const MIN_PASSWORD_LEN: usize = 6;

/// Partial user for create, update and profile edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserDraft {
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.full_name, Some(name) if name.trim().is_empty()) {
            return Err(ApiError::Invalid("full name cannot be empty".to_string()));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ApiError::Invalid(format!("invalid email: {}", email)));
            }
        }
        if let Some(password) = &self.password {
            if password.chars().count() < MIN_PASSWORD_LEN {
                return Err(ApiError::Invalid(format!(
                    "password must be at least {} characters",
                    MIN_PASSWORD_LEN
                )));
            }
        }
        Ok(())
    }

    /// New accounts need a name, an email, a role and a password.
    pub fn validate_new(&self) -> Result<()> {
        if self.full_name.is_none()
            || self.email.is_none()
            || self.role.is_none()
            || self.password.is_none()
        {
            return Err(ApiError::Invalid(
                "full name, email, role and password are required".to_string(),
            ));
        }
        self.validate()
    }
}

#[derive(Clone)]
pub struct UsersApi {
    gateway: Gateway,
}

impl UsersApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        fetch(&self.gateway, ApiRequest::get(USERS_PATH)).await
    }

    pub async fn create(&self, draft: &UserDraft) -> Result<User> {
        draft.validate_new()?;
        let request = ApiRequest::post(USERS_PATH).with_json(serde_json::to_value(draft)?);
        let user: User = fetch(&self.gateway, request).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "Created user");
        Ok(user)
    }

    pub async fn update(&self, id: &str, draft: &UserDraft) -> Result<User> {
        draft.validate()?;
        let path = format!("{}/{}", USERS_PATH, segment(id)?);
        let request = ApiRequest::patch(path).with_json(serde_json::to_value(draft)?);
        fetch(&self.gateway, request).await
    }

    /// Activate or deactivate an account; returns the updated user.
    pub async fn toggle_status(&self, id: &str) -> Result<User> {
        let path = format!("{}/{}/toggle-status", USERS_PATH, segment(id)?);
        let user: User = fetch(&self.gateway, ApiRequest::patch(path)).await?;

        tracing::info!(user_id = %user.id, active = user.is_active, "Toggled user status");
        Ok(user)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = format!("{}/{}", USERS_PATH, segment(id)?);
        execute(&self.gateway, ApiRequest::delete(path)).await?;

        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }
}

#[derive(Clone)]
pub struct ProfileApi {
    gateway: Gateway,
}

impl ProfileApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn get(&self) -> Result<User> {
        fetch(&self.gateway, ApiRequest::get(PROFILE_PATH)).await
    }

    /// Role changes are not accepted through the profile.
    pub async fn update(&self, draft: &UserDraft) -> Result<User> {
        let draft = UserDraft {
            role: None,
            ..draft.clone()
        };
        draft.validate()?;

        let request = ApiRequest::patch(PROFILE_PATH).with_json(serde_json::to_value(&draft)?);
        fetch(&self.gateway, request).await
    }
}
