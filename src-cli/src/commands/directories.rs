//! Reference directory commands
use estate_core::{Directory, DirectoryKind, Guard};

use super::CommandResult;
use crate::state::AppState;

pub async fn list(state: &AppState, kind: Option<DirectoryKind>) -> CommandResult<Vec<Directory>> {
    if let Err(e) = state.require(&Guard::protected()).await {
        return CommandResult::err(e);
    }
    state.backoffice().directories().list(kind).await.into()
}

pub async fn create(state: &AppState, kind: DirectoryKind, name: &str) -> CommandResult<Directory> {
    if let Err(e) = state.require(&Guard::admin_only()).await {
        return CommandResult::err(e);
    }
    state.backoffice().directories().create(kind, name).await.into()
}

pub async fn update(
    state: &AppState,
    kind: DirectoryKind,
    id: &str,
    name: &str,
) -> CommandResult<Directory> {
    if let Err(e) = state.require(&Guard::admin_only()).await {
        return CommandResult::err(e);
    }
    state
        .backoffice()
        .directories()
        .update(kind, id, name)
        .await
        .into()
}

pub async fn delete(state: &AppState, kind: DirectoryKind, id: &str) -> CommandResult<String> {
    if let Err(e) = state.require(&Guard::admin_only()).await {
        return CommandResult::err(e);
    }
    state
        .backoffice()
        .directories()
        .delete(kind, id)
        .await
        .map(|_| id.to_string())
        .into()
}
