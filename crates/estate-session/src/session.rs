//! Session data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "agent" => Ok(Role::Agent),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Identity record returned by the login and profile endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// Display name
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub apartment_count: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Access credential and refresh credential, always held together.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    access: String,
    refresh: String,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    pub fn access(&self) -> &str {
        &self.access
    }

    pub fn refresh(&self) -> &str {
        &self.refresh
    }

    /// Both tokens are non-blank.
    pub fn is_usable(&self) -> bool {
        !self.access.trim().is_empty() && !self.refresh.trim().is_empty()
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Current authentication state.
///
/// Only [`crate::SessionStore`] mutates a live session; values handed out
/// are snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub(crate) user: Option<User>,
    pub(crate) credentials: Option<CredentialPair>,
    /// A login attempt is in flight
    pub loading: bool,
    /// Message from the last failed login attempt
    pub error: Option<String>,
    /// Authenticity confirmed at least once (or absence of credentials confirmed)
    pub initialized: bool,
}

impl Session {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn credentials(&self) -> Option<&CredentialPair> {
        self.credentials.as_ref()
    }

    pub fn access_credential(&self) -> Option<&str> {
        self.credentials.as_ref().map(CredentialPair::access)
    }

    pub fn refresh_credential(&self) -> Option<&str> {
        self.credentials.as_ref().map(CredentialPair::refresh)
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}
