//! Application root
//!
//! One [`Backoffice`] per process. It owns the session store and hands out
//! resource clients that all share the same gateway, so a refresh done on
//! behalf of one client is seen by every other.

use std::sync::Arc;

use tokio::sync::{watch, OnceCell};

use estate_api::{
    ApartmentFilters, ApartmentPage, DirectoriesApi, ListingsApi, PageRequest, ProfileApi,
    UserDraft, UsersApi,
};
use estate_gateway::{AuthEndpoints, Authenticator, Gateway, HttpTransport, Transport};
use estate_session::{DatabaseVault, Decision, Guard, Session, SessionStore, User};
use estate_storage::Database;

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

#[derive(Clone)]
pub struct Backoffice {
    config: Config,
    store: SessionStore,
    gateway: Gateway,
    auth: Authenticator,
    listings: ListingsApi,
    users: UsersApi,
    directories: DirectoriesApi,
    profile: ProfileApi,
    bootstrap: Arc<OnceCell<()>>,
}

impl Backoffice {
    /// Open the credential database and wire up the HTTP stack.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let store = SessionStore::new(Arc::new(DatabaseVault::new(db)));
        let transport = HttpTransport::new(&config.api_base_url, config.request_timeout())?;

        tracing::debug!(api = %config.api_base_url, "Back office configured");

        Ok(Self::assemble(config, store, Arc::new(transport)))
    }

    /// Build around an existing store and transport.
    pub fn with_parts(store: SessionStore, transport: Arc<dyn Transport>) -> Self {
        Self::assemble(Config::default(), store, transport)
    }

    fn assemble(config: Config, store: SessionStore, transport: Arc<dyn Transport>) -> Self {
        let gateway = Gateway::new(Arc::clone(&transport), store.clone());
        let auth = Authenticator::new(AuthEndpoints::new(transport), store.clone());

        Self {
            config,
            listings: ListingsApi::new(gateway.clone()),
            users: UsersApi::new(gateway.clone()),
            directories: DirectoriesApi::new(gateway.clone()),
            profile: ProfileApi::new(gateway.clone()),
            store,
            gateway,
            auth,
            bootstrap: Arc::new(OnceCell::new()),
        }
    }

    /// Restore the session from stored credentials.
    ///
    /// Runs once; later calls wait for the first to finish and return the
    /// current snapshot. The session is always initialized afterwards.
    pub async fn initialize(&self) -> Session {
        self.bootstrap.get_or_init(|| self.run_bootstrap()).await;
        self.store.snapshot()
    }

    async fn run_bootstrap(&self) {
        if self.store.hydrate().is_none() {
            tracing::info!("No stored credentials; starting signed out");
            self.store.mark_initialized();
            return;
        }

        match self.confirm_user().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "Session restored");
            }
            Err(CoreError::Api(e)) => {
                tracing::warn!(transient = e.is_transient(), "Failed to restore session: {}", e);
            }
            Err(e) => tracing::warn!("Failed to restore session: {}", e),
        }

        self.store.mark_initialized();
    }

    /// Fetch the identity behind the held credentials and attach it.
    async fn confirm_user(&self) -> Result<User> {
        let user = self.profile.get().await?;
        let credentials = self.store.credentials().ok_or(CoreError::NotSignedIn)?;
        self.store.complete_login(user.clone(), credentials);
        Ok(user)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> Session {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn decide(&self, guard: &Guard) -> Decision {
        guard.evaluate(&self.store.snapshot())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        Ok(self.auth.login(email, password).await?)
    }

    pub fn logout(&self) {
        self.auth.logout();
    }

    pub fn listings(&self) -> &ListingsApi {
        &self.listings
    }

    pub fn users(&self) -> &UsersApi {
        &self.users
    }

    pub fn directories(&self) -> &DirectoriesApi {
        &self.directories
    }

    pub fn profile(&self) -> &ProfileApi {
        &self.profile
    }

    /// Signed-in user, once the bootstrap has settled.
    ///
    /// Credentials kept without a confirmed user (the bootstrap profile
    /// fetch failed) are confirmed here against the profile endpoint.
    pub async fn current_user(&self) -> Result<User> {
        if !self.store.is_initialized() {
            return Err(CoreError::NotInitialized);
        }
        if let Some(user) = self.store.user() {
            return Ok(user);
        }
        if self.store.credentials().is_none() {
            return Err(CoreError::NotSignedIn);
        }

        let user = self.confirm_user().await?;
        tracing::info!(user_id = %user.id, "Session confirmed");
        Ok(user)
    }

    /// Update the profile and keep the session's user in step.
    pub async fn update_profile(&self, draft: &UserDraft) -> Result<User> {
        let user = self.profile.update(draft).await?;
        if let Some(credentials) = self.store.credentials() {
            self.store.complete_login(user.clone(), credentials);
        }
        Ok(user)
    }

    /// Listings the current user may see. Agents are limited to their own.
    pub async fn visible_listings(
        &self,
        page: PageRequest,
        filters: ApartmentFilters,
    ) -> Result<ApartmentPage> {
        let user = self.current_user().await?;
        let filters = filters.scoped_for(&user);
        Ok(self.listings.list(page, &filters).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_api::ApiError;
    use estate_session::{CredentialVault, MemoryVault, Role};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;
    use std::time::Duration;

    fn user_json(id: &str, role: &str) -> String {
        json!({
            "id": id,
            "email": format!("{}@example.com", id),
            "fullName": "Test User",
            "role": role,
        })
        .to_string()
    }

    fn backoffice(server: &ServerGuard, vault: MemoryVault) -> Backoffice {
        let transport = HttpTransport::new(&server.url(), Duration::from_secs(5)).unwrap();
        let store = SessionStore::new(Arc::new(vault));
        Backoffice::with_parts(store, Arc::new(transport))
    }

    #[tokio::test]
    async fn test_bootstrap_without_credentials() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let app = backoffice(&server, MemoryVault::new());
        assert_eq!(app.decide(&Guard::protected()), Decision::Pending);

        let session = app.initialize().await;
        assert!(session.initialized);
        assert!(!session.is_authenticated());
        assert_eq!(app.decide(&Guard::protected()), Decision::RedirectToLogin);
        assert!(matches!(app.current_user().await, Err(CoreError::NotSignedIn)));

        any.assert_async().await;
    }

    #[tokio::test]
    async fn test_bootstrap_restores_session() {
        let mut server = Server::new_async().await;
        let profile = server
            .mock("GET", "/users/profile")
            .match_header("authorization", "Bearer a1")
            .with_status(200)
            .with_body(user_json("admin-1", "admin"))
            .expect(1)
            .create_async()
            .await;

        let app = backoffice(&server, MemoryVault::with_entries(Some("a1"), Some("r1")));

        let session = app.initialize().await;
        assert!(session.initialized);
        assert_eq!(session.role(), Some(Role::Admin));
        assert_eq!(session.access_credential(), Some("a1"));
        assert_eq!(app.decide(&Guard::admin_only()), Decision::Allow);

        // Second call does not hit the network again
        app.initialize().await;
        profile.assert_async().await;
    }

    #[tokio::test]
    async fn test_bootstrap_refreshes_expired_access() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/profile")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .match_body(Matcher::Json(json!({"refreshToken": "r1"})))
            .with_status(200)
            .with_body(r#"{"accessToken":"a2","refreshToken":"r2"}"#)
            .expect(1)
            .create_async()
            .await;
        // Once to confirm the new pair, once for the retried request
        let fresh_profile = server
            .mock("GET", "/users/profile")
            .match_header("authorization", "Bearer a2")
            .with_status(200)
            .with_body(user_json("agent-1", "agent"))
            .expect(2)
            .create_async()
            .await;

        let vault = MemoryVault::with_entries(Some("stale"), Some("r1"));
        let app = backoffice(&server, vault.clone());

        let session = app.initialize().await;
        assert!(session.is_authenticated());
        assert_eq!(session.access_credential(), Some("a2"));
        assert_eq!(vault.contents().refresh.as_deref(), Some("r2"));

        refresh.assert_async().await;
        fresh_profile.assert_async().await;
    }

    #[tokio::test]
    async fn test_bootstrap_with_revoked_refresh_signs_out() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/profile")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/auth/refresh")
            .with_status(401)
            .create_async()
            .await;

        let vault = MemoryVault::with_entries(Some("stale"), Some("revoked"));
        let app = backoffice(&server, vault.clone());

        let session = app.initialize().await;
        assert!(session.initialized);
        assert!(!session.is_authenticated());
        assert!(vault.load().unwrap().is_empty());
        assert_eq!(app.decide(&Guard::protected()), Decision::RedirectToLogin);
    }

    #[tokio::test]
    async fn test_bootstrap_keeps_credentials_on_server_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/profile")
            .with_status(503)
            .create_async()
            .await;

        let vault = MemoryVault::with_entries(Some("a1"), Some("r1"));
        let app = backoffice(&server, vault.clone());

        let session = app.initialize().await;
        assert!(session.initialized);
        assert!(session.user().is_none());
        assert_eq!(session.access_credential(), Some("a1"));
        assert!(!vault.contents().is_empty());
    }

    #[tokio::test]
    async fn test_unconfirmed_session_recovers_on_next_use() {
        let mut server = Server::new_async().await;
        let outage = server
            .mock("GET", "/users/profile")
            .with_status(503)
            .create_async()
            .await;

        let app = backoffice(&server, MemoryVault::with_entries(Some("a1"), Some("r1")));
        app.initialize().await;
        assert_eq!(app.decide(&Guard::protected()), Decision::Allow);
        assert!(app.session().user().is_none());

        outage.remove_async().await;
        server
            .mock("GET", "/users/profile")
            .match_header("authorization", "Bearer a1")
            .with_status(200)
            .with_body(user_json("agent-1", "agent"))
            .create_async()
            .await;
        let listings = server
            .mock("GET", "/apartments")
            .match_query(Matcher::UrlEncoded("userId".into(), "agent-1".into()))
            .with_status(200)
            .with_body(r#"{"apartments":[],"total":0}"#)
            .create_async()
            .await;

        let page = app
            .visible_listings(PageRequest::default(), ApartmentFilters::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(app.session().role(), Some(Role::Agent));
        assert_eq!(app.current_user().await.unwrap().id, "agent-1");
        listings.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_then_scoped_listings() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(json!({"email": "agent@example.com", "password": "secret1"})))
            .with_status(200)
            .with_body(
                json!({
                    "user": {"id": "agent-7", "email": "agent@example.com", "fullName": "Agent", "role": "agent"},
                    "accessToken": "a1",
                    "refreshToken": "r1"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let listings = server
            .mock("GET", "/apartments")
            .match_header("authorization", "Bearer a1")
            .match_query(Matcher::UrlEncoded("userId".into(), "agent-7".into()))
            .with_status(200)
            .with_body(r#"{"apartments":[],"total":0}"#)
            .create_async()
            .await;

        let app = backoffice(&server, MemoryVault::new());
        app.initialize().await;

        let user = app.login("agent@example.com", "secret1").await.unwrap();
        assert_eq!(user.role, Role::Agent);
        assert_eq!(app.decide(&Guard::admin_only()), Decision::Forbidden);

        let filters = ApartmentFilters {
            user_id: Some("agent-1".into()),
            ..ApartmentFilters::default()
        };
        let page = app
            .visible_listings(PageRequest::default(), filters)
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        listings.assert_async().await;

        app.logout();
        assert!(!app.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_login_records_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"message":"Invalid credentials"}"#)
            .create_async()
            .await;

        let app = backoffice(&server, MemoryVault::new());
        app.initialize().await;

        let err = app.login("agent@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(_)));

        let session = app.session();
        assert_eq!(session.error.as_deref(), Some("Invalid credentials"));
        assert!(!session.loading);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_update_profile_refreshes_user() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/profile")
            .with_status(200)
            .with_body(user_json("agent-1", "agent"))
            .create_async()
            .await;
        server
            .mock("PATCH", "/users/profile")
            .with_status(200)
            .with_body(
                json!({"id": "agent-1", "email": "agent-1@example.com", "fullName": "Renamed", "role": "agent"})
                    .to_string(),
            )
            .create_async()
            .await;

        let app = backoffice(&server, MemoryVault::with_entries(Some("a1"), Some("r1")));
        app.initialize().await;

        let draft = UserDraft {
            full_name: Some("Renamed".into()),
            ..UserDraft::default()
        };
        app.update_profile(&draft).await.unwrap();
        assert_eq!(app.session().user().unwrap().full_name, "Renamed");
    }

    #[tokio::test]
    async fn test_listings_before_bootstrap() {
        let server = Server::new_async().await;
        let app = backoffice(&server, MemoryVault::new());

        let result = app
            .visible_listings(PageRequest::default(), ApartmentFilters::default())
            .await;
        assert!(matches!(result, Err(CoreError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_expired_session_surfaces_as_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/profile")
            .match_header("authorization", "Bearer a1")
            .with_status(200)
            .with_body(user_json("admin-1", "admin"))
            .create_async()
            .await;
        server
            .mock("GET", "/users")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/auth/refresh")
            .with_status(401)
            .create_async()
            .await;

        let app = backoffice(&server, MemoryVault::with_entries(Some("a1"), Some("r1")));
        app.initialize().await;
        assert!(app.session().is_authenticated());

        let err = app.users().list().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert!(!app.session().is_authenticated());
        assert_eq!(app.decide(&Guard::protected()), Decision::RedirectToLogin);
    }

    #[test]
    fn test_new_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("nested"));

        let app = Backoffice::new(config.clone()).unwrap();
        assert!(config.database_path.exists());
        assert_eq!(app.config().api_base_url, "http://localhost:3000");
    }
}
