//! Shared request plumbing for the resource clients

use serde::de::DeserializeOwned;

use estate_gateway::{ApiOutcome, ApiRequest, Gateway};

use crate::error::ApiError;
use crate::Result;

pub(crate) async fn fetch<T: DeserializeOwned>(gateway: &Gateway, request: ApiRequest) -> Result<T> {
    let response = gateway.send(&request).await?;
    settle(response.outcome::<T>())
}

pub(crate) async fn execute(gateway: &Gateway, request: ApiRequest) -> Result<()> {
    let response = gateway.send(&request).await?;
    settle(response.outcome_unit())
}

fn settle<T>(outcome: ApiOutcome<T>) -> Result<T> {
    match outcome {
        ApiOutcome::Ok(value) => Ok(value),
        ApiOutcome::AuthError(_) => Err(ApiError::SessionExpired),
        ApiOutcome::OtherError(failure) => {
            tracing::debug!(status = %failure.status(), "Request failed");
            Err(failure.into())
        }
    }
}

/// Path segment from caller input; `/`, `?` and `#` would change the route.
pub(crate) fn segment(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(ApiError::Invalid(format!("invalid identifier: {:?}", id)));
    }
    Ok(id)
}

/// Gateway against a mock server with an agent session holding `a1`/`r1`.
#[cfg(test)]
pub(crate) fn test_gateway(base_url: &str) -> (Gateway, estate_session::SessionStore) {
    use estate_gateway::HttpTransport;
    use estate_session::{CredentialPair, MemoryVault, SessionStore, User};
    use std::sync::Arc;
    use std::time::Duration;

    let transport = HttpTransport::new(base_url, Duration::from_secs(5)).unwrap();
    let store = SessionStore::new(Arc::new(MemoryVault::new()));
    let user: User = serde_json::from_str(
        r#"{"id":"agent-1","email":"agent@example.com","fullName":"Agent","role":"agent"}"#,
    )
    .unwrap();
    store.complete_login(user, CredentialPair::new("a1", "r1"));

    (Gateway::new(Arc::new(transport), store.clone()), store)
}
