//! Listing commands
use estate_core::{Apartment, ApartmentDraft, ApartmentFilters, ApartmentPage, Guard, PageRequest};

use super::{parse_json, CommandResult};
use crate::state::AppState;

pub async fn list(
    state: &AppState,
    page: PageRequest,
    filters: ApartmentFilters,
) -> CommandResult<ApartmentPage> {
    if let Err(e) = state.require(&Guard::protected()).await {
        return CommandResult::err(e);
    }
    state.backoffice().visible_listings(page, filters).await.into()
}

pub async fn get(state: &AppState, id: &str) -> CommandResult<Apartment> {
    if let Err(e) = state.require(&Guard::protected()).await {
        return CommandResult::err(e);
    }
    state.backoffice().listings().get(id).await.into()
}

pub async fn create(state: &AppState, raw: &str) -> CommandResult<Apartment> {
    let user = match state.require(&Guard::protected()).await {
        Ok(user) => user,
        Err(e) => return CommandResult::err(e),
    };
    let draft: ApartmentDraft = match parse_json(raw) {
        Ok(draft) => draft,
        Err(e) => return CommandResult::err(e),
    };

    let draft = draft.for_role(user.role);
    state.backoffice().listings().create(&draft).await.into()
}

pub async fn update(state: &AppState, id: &str, raw: &str) -> CommandResult<Apartment> {
    let user = match state.require(&Guard::protected()).await {
        Ok(user) => user,
        Err(e) => return CommandResult::err(e),
    };
    let draft: ApartmentDraft = match parse_json(raw) {
        Ok(draft) => draft,
        Err(e) => return CommandResult::err(e),
    };

    let draft = draft.for_role(user.role);
    state.backoffice().listings().update(id, &draft).await.into()
}

pub async fn delete(state: &AppState, id: &str) -> CommandResult<String> {
    if let Err(e) = state.require(&Guard::protected()).await {
        return CommandResult::err(e);
    }
    state
        .backoffice()
        .listings()
        .delete(id)
        .await
        .map(|_| id.to_string())
        .into()
}
