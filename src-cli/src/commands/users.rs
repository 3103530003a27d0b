//! User administration commands (admin only)
use estate_core::{Guard, User, UserDraft};

use super::CommandResult;
use crate::state::AppState;

pub async fn list(state: &AppState) -> CommandResult<Vec<User>> {
    if let Err(e) = state.require(&Guard::admin_only()).await {
        return CommandResult::err(e);
    }
    state.backoffice().users().list().await.into()
}

pub async fn create(state: &AppState, draft: UserDraft) -> CommandResult<User> {
    if let Err(e) = state.require(&Guard::admin_only()).await {
        return CommandResult::err(e);
    }
    state.backoffice().users().create(&draft).await.into()
}

pub async fn update(state: &AppState, id: &str, draft: UserDraft) -> CommandResult<User> {
    if let Err(e) = state.require(&Guard::admin_only()).await {
        return CommandResult::err(e);
    }
    state.backoffice().users().update(id, &draft).await.into()
}

pub async fn toggle_status(state: &AppState, id: &str) -> CommandResult<User> {
    if let Err(e) = state.require(&Guard::admin_only()).await {
        return CommandResult::err(e);
    }
    state.backoffice().users().toggle_status(id).await.into()
}

pub async fn delete(state: &AppState, id: &str) -> CommandResult<String> {
    let admin = match state.require(&Guard::admin_only()).await {
        Ok(user) => user,
        Err(e) => return CommandResult::err(e),
    };
    if admin.id == id.trim() {
        return CommandResult::err("Refusing to delete the signed-in account".to_string());
    }

    state
        .backoffice()
        .users()
        .delete(id)
        .await
        .map(|_| id.to_string())
        .into()
}
