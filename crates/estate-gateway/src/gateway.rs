//! Authenticated Request Gateway
//!
//! Lifecycle of one `send`:
//! ```text
//! Sent ──(not 401)──────────────────────────────► Done
//!   └─(401)─► Refreshing ──(renewed)──► Retried ─► Done
//!                 └──────(failed)────► LoggedOut ─► Done
//! ```
//! Phases only move forward, so a request refreshes at most once and is
//! replayed at most once.

use std::sync::Arc;
use tokio::sync::Mutex;

use estate_session::SessionStore;

use crate::auth::AuthEndpoints;
use crate::request::{ApiRequest, ApiResponse};
use crate::transport::Transport;
use crate::Result;

enum Phase {
    Sent,
    Refreshing {
        original: ApiResponse,
        /// Access credential the rejected attempt carried
        stale: Option<String>,
    },
    Retried {
        access: String,
    },
    LoggedOut {
        original: ApiResponse,
    },
    Done(ApiResponse),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Sent => "sent",
            Phase::Refreshing { .. } => "refreshing",
            Phase::Retried { .. } => "retried",
            Phase::LoggedOut { .. } => "logged_out",
            Phase::Done(_) => "done",
        }
    }
}

enum Renewal {
    Renewed(String),
    Failed,
}

#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    auth: AuthEndpoints,
    store: SessionStore,
    /// Serializes refresh cycles when coalescing
    refresh_gate: Arc<Mutex<()>>,
    coalesce: bool,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, store: SessionStore) -> Self {
        let auth = AuthEndpoints::new(Arc::clone(&transport));

        Self {
            transport,
            auth,
            store,
            refresh_gate: Arc::new(Mutex::new(())),
            coalesce: true,
        }
    }

    /// When enabled (the default), concurrent 401s share one refresh call;
    /// requests that waited replay with the credentials it produced.
    pub fn coalesce_refreshes(mut self, enabled: bool) -> Self {
        self.coalesce = enabled;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Send `request` with the current access credential.
    ///
    /// Any non-401 response is returned unchanged. A 401 is resolved here:
    /// either the request is replayed once with renewed credentials and
    /// that response is returned, or the session is cleared and the
    /// original 401 is returned. Transport failures are propagated.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut phase = Phase::Sent;

        loop {
            let next = match phase {
                Phase::Sent => {
                    let bearer = self.store.credentials().map(|c| c.access().to_string());
                    let response = self.transport.execute(request, bearer.as_deref()).await?;

                    if response.is_unauthorized() {
                        Phase::Refreshing {
                            original: response,
                            stale: bearer,
                        }
                    } else {
                        Phase::Done(response)
                    }
                }
                Phase::Refreshing { original, stale } => {
                    match self.renew(stale.as_deref()).await {
                        Renewal::Renewed(access) => Phase::Retried { access },
                        Renewal::Failed => Phase::LoggedOut { original },
                    }
                }
                Phase::Retried { access } => {
                    let response = self.transport.execute(request, Some(&access)).await?;
                    Phase::Done(response)
                }
                Phase::LoggedOut { original } => {
                    self.store.clear();
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        "Session expired"
                    );
                    Phase::Done(original)
                }
                Phase::Done(response) => return Ok(response),
            };

            tracing::debug!(
                method = %request.method,
                path = %request.path,
                phase = next.name(),
                "Gateway transition"
            );
            phase = next;
        }
    }

    async fn renew(&self, stale: Option<&str>) -> Renewal {
        let _gate = if self.coalesce {
            Some(self.refresh_gate.lock().await)
        } else {
            None
        };

        let current = match self.store.credentials() {
            Some(current) => current,
            None => return Renewal::Failed,
        };

        // Another request already rotated the pair while this one waited
        if self.coalesce && stale != Some(current.access()) {
            tracing::debug!("Reusing credentials from a concurrent refresh");
            return Renewal::Renewed(current.access().to_string());
        }

        let pair = match self.auth.refresh(current.refresh()).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("Credential refresh failed: {}", e);
                return Renewal::Failed;
            }
        };

        let user = match self.auth.profile(pair.access()).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Profile check after refresh failed: {}", e);
                return Renewal::Failed;
            }
        };

        tracing::info!(user_id = %user.id, "Credentials refreshed");
        let access = pair.access().to_string();
        self.store.complete_login(user, pair);
        Renewal::Renewed(access)
    }
}
