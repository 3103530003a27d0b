//! Route access decisions
//!
//! | Guard        | Unauthenticated | Agent     | Admin |
//! |--------------|-----------------|-----------|-------|
//! | `protected`  | login           | allow     | allow |
//! | `admin_only` | login           | forbidden | allow |
//!
//! Nothing is decided before the session is initialized.

use serde::{Deserialize, Serialize};

use crate::session::{Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Authenticity not confirmed yet; show a placeholder
    Pending,
    RedirectToLogin,
    Forbidden,
    Allow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    /// `None` admits every role
    allowed_roles: Option<Vec<Role>>,
}

impl Guard {
    pub fn protected() -> Self {
        Self {
            allowed_roles: None,
        }
    }

    pub fn admin_only() -> Self {
        Self::roles(vec![Role::Admin])
    }

    pub fn roles(roles: Vec<Role>) -> Self {
        Self {
            allowed_roles: Some(roles),
        }
    }

    pub fn evaluate(&self, session: &Session) -> Decision {
        if !session.initialized {
            return Decision::Pending;
        }
        if !session.is_authenticated() {
            return Decision::RedirectToLogin;
        }

        // Credentials without a confirmed user are let through; the
        // server still checks every request.
        match (&self.allowed_roles, session.role()) {
            (Some(roles), Some(role)) if !roles.contains(&role) => Decision::Forbidden,
            _ => Decision::Allow,
        }
    }
}

/// The login screen should send an authenticated user elsewhere.
pub fn login_redirect(session: &Session) -> bool {
    session.is_authenticated()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CredentialPair, User};

    fn session(role: Option<Role>, initialized: bool) -> Session {
        let user = role.map(|role| User {
            id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            full_name: "U One".to_string(),
            role,
            apartment_count: 0,
            is_active: true,
            created_at: None,
        });
        Session {
            credentials: Some(CredentialPair::new("a", "r")),
            user,
            initialized,
            ..Session::default()
        }
    }

    #[test]
    fn test_pending_before_initialization() {
        let guard = Guard::admin_only();
        assert_eq!(guard.evaluate(&Session::default()), Decision::Pending);
        assert_eq!(
            guard.evaluate(&session(Some(Role::Agent), false)),
            Decision::Pending
        );
    }

    #[test]
    fn test_unauthenticated_redirects() {
        let anonymous = Session {
            initialized: true,
            ..Session::default()
        };
        assert_eq!(
            Guard::protected().evaluate(&anonymous),
            Decision::RedirectToLogin
        );
        assert!(!login_redirect(&anonymous));
    }

    #[test]
    fn test_role_gating() {
        let agent = session(Some(Role::Agent), true);
        let admin = session(Some(Role::Admin), true);

        assert_eq!(Guard::protected().evaluate(&agent), Decision::Allow);
        assert_eq!(Guard::admin_only().evaluate(&agent), Decision::Forbidden);
        assert_eq!(Guard::admin_only().evaluate(&admin), Decision::Allow);
        assert!(login_redirect(&admin));
    }

    #[test]
    fn test_unconfirmed_user_allowed() {
        let hydrated = session(None, true);
        assert_eq!(Guard::admin_only().evaluate(&hydrated), Decision::Allow);
    }
}
