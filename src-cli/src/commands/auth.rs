//! Sign-in, sign-out and profile commands
use serde::{Deserialize, Serialize};

use estate_core::{login_redirect, Guard, Role, Session, User, UserDraft};

use super::CommandResult;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub initialized: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub error: Option<String>,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        let user = session.user();
        Self {
            authenticated: session.is_authenticated(),
            initialized: session.initialized,
            user_id: user.map(|u| u.id.clone()),
            email: user.map(|u| u.email.clone()),
            full_name: user.map(|u| u.full_name.clone()),
            role: session.role(),
            error: session.error.clone(),
        }
    }
}

pub async fn login(state: &AppState, email: &str, password: &str) -> CommandResult<SessionInfo> {
    let backoffice = state.backoffice();
    if login_redirect(&backoffice.session()) {
        tracing::info!("Already signed in; replacing session");
    }

    match backoffice.login(email, password).await {
        Ok(_) => CommandResult::ok(SessionInfo::from(&backoffice.session())),
        Err(_) => {
            let session = backoffice.session();
            CommandResult::err(
                session
                    .error
                    .unwrap_or_else(|| "Authorization failed".to_string()),
            )
        }
    }
}

pub fn logout(state: &AppState) -> CommandResult<SessionInfo> {
    state.backoffice().logout();
    CommandResult::ok(SessionInfo::from(&state.backoffice().session()))
}

pub fn whoami(state: &AppState) -> CommandResult<SessionInfo> {
    CommandResult::ok(SessionInfo::from(&state.backoffice().session()))
}

pub async fn show_profile(state: &AppState) -> CommandResult<User> {
    if let Err(e) = state.require(&Guard::protected()).await {
        return CommandResult::err(e);
    }
    state.backoffice().profile().get().await.into()
}

pub async fn update_profile(state: &AppState, draft: UserDraft) -> CommandResult<User> {
    if let Err(e) = state.require(&Guard::protected()).await {
        return CommandResult::err(e);
    }
    state.backoffice().update_profile(&draft).await.into()
}
