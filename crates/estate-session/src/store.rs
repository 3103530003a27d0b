//! Session Store
//!
//! Holds the single [`Session`] and exposes the only operations allowed to
//! change it. Every operation is total: vault failures are logged and the
//! in-memory state still moves forward.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

use crate::session::{CredentialPair, Session, User};
use crate::vault::CredentialVault;

pub struct SessionStore {
    /// Live session state
    state: Arc<RwLock<Session>>,
    /// Durable credential storage
    vault: Arc<dyn CredentialVault>,
    /// Change notifications for the UI layer
    changes: Arc<watch::Sender<Session>>,
}

impl SessionStore {
    pub fn new(vault: Arc<dyn CredentialVault>) -> Self {
        let (changes, _) = watch::channel(Session::default());

        Self {
            state: Arc::new(RwLock::new(Session::default())),
            vault,
            changes: Arc::new(changes),
        }
    }

    /// Load a previously persisted credential pair.
    ///
    /// A half-written pair is treated as absent and erased. The session is
    /// not initialized by this; the bootstrap profile fetch decides that.
    pub fn hydrate(&self) -> Option<CredentialPair> {
        let stored = match self.vault.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("Failed to read credential vault: {}", e);
                return None;
            }
        };

        let was_empty = stored.is_empty();
        let pair = stored.into_pair();

        match &pair {
            Some(pair) => {
                let pair = pair.clone();
                self.mutate(|session| {
                    session.user = None;
                    session.credentials = Some(pair);
                });
                tracing::info!("Hydrated session from stored credentials");
            }
            None if !was_empty => {
                tracing::warn!("Discarding incomplete stored credentials");
                if let Err(e) = self.vault.erase() {
                    tracing::error!("Failed to erase credential vault: {}", e);
                }
            }
            None => {}
        }

        pair
    }

    pub fn begin_login(&self) {
        self.mutate(|session| {
            session.loading = true;
            session.error = None;
        });
    }

    pub fn complete_login(&self, user: User, credentials: CredentialPair) {
        let user_id = user.id.clone();
        let persisted = credentials.clone();

        self.mutate(|session| {
            session.user = Some(user);
            session.credentials = Some(credentials);
            session.loading = false;
        });

        if let Err(e) = self.vault.store(&persisted) {
            tracing::error!(user_id = %user_id, "Failed to persist credentials: {}", e);
        }

        tracing::debug!(user_id = %user_id, "Session established");
    }

    /// Record a failed login attempt. An existing session is kept.
    pub fn fail_login(&self, message: impl Into<String>) {
        let message = message.into();
        self.mutate(|session| {
            session.loading = false;
            session.error = Some(message);
        });
    }

    /// Drop identity and credentials, in memory and in the vault.
    pub fn clear(&self) {
        self.mutate(|session| {
            session.user = None;
            session.credentials = None;
        });

        if let Err(e) = self.vault.erase() {
            tracing::error!("Failed to erase credential vault: {}", e);
        }
    }

    pub fn mark_initialized(&self) {
        if self.state.read().initialized {
            return;
        }
        self.mutate(|session| session.initialized = true);
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn credentials(&self) -> Option<CredentialPair> {
        self.state.read().credentials.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    /// Receive a snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.changes.subscribe()
    }

    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut Session),
    {
        let snapshot = {
            let mut session = self.state.write();
            f(&mut session);
            debug_assert!(session.user.is_none() || session.credentials.is_some());
            session.clone()
        };
        self.changes.send_replace(snapshot);
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            vault: Arc::clone(&self.vault),
            changes: Arc::clone(&self.changes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use crate::error::SessionError;
    use crate::vault::{DatabaseVault, MemoryVault, StoredCredentials};
    use estate_storage::Database;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            full_name: "Test User".to_string(),
            role: Role::Agent,
            apartment_count: 0,
            is_active: true,
            created_at: None,
        }
    }

    fn store_with(vault: &MemoryVault) -> SessionStore {
        SessionStore::new(Arc::new(vault.clone()))
    }

    fn assert_invariants(session: &Session) {
        if session.user().is_some() {
            assert!(session.access_credential().is_some());
        }
        assert_eq!(
            session.access_credential().is_some(),
            session.refresh_credential().is_some()
        );
    }

    #[test]
    fn test_complete_login_persists_pair() {
        let vault = MemoryVault::new();
        let store = store_with(&vault);

        store.begin_login();
        assert!(store.snapshot().loading);

        store.complete_login(user("u1"), CredentialPair::new("a1", "r1"));

        let session = store.snapshot();
        assert!(!session.loading);
        assert_eq!(session.user().unwrap().id, "u1");
        assert_eq!(session.access_credential(), Some("a1"));
        assert_eq!(vault.contents().refresh.as_deref(), Some("r1"));
        assert_invariants(&session);
    }

    #[test]
    fn test_complete_login_idempotent() {
        let store = store_with(&MemoryVault::new());

        store.complete_login(user("u1"), CredentialPair::new("a1", "r1"));
        let once = store.snapshot();
        store.complete_login(user("u1"), CredentialPair::new("a1", "r1"));
        assert_eq!(store.snapshot(), once);
    }

    #[test]
    fn test_failed_login_keeps_existing_session() {
        let store = store_with(&MemoryVault::new());
        store.complete_login(user("u1"), CredentialPair::new("a1", "r1"));

        store.begin_login();
        assert!(store.snapshot().error.is_none());
        store.fail_login("bad credentials");

        let session = store.snapshot();
        assert!(!session.loading);
        assert_eq!(session.error.as_deref(), Some("bad credentials"));
        assert_eq!(session.access_credential(), Some("a1"));
        assert_eq!(session.user().unwrap().id, "u1");
    }

    #[test]
    fn test_clear_erases_vault_from_any_state() {
        let states: Vec<Box<dyn Fn(&SessionStore)>> = vec![
            Box::new(|_| {}),
            Box::new(|s| s.begin_login()),
            Box::new(|s| s.complete_login(user("u1"), CredentialPair::new("a", "r"))),
            Box::new(|s| {
                s.complete_login(user("u1"), CredentialPair::new("a", "r"));
                s.fail_login("nope");
            }),
        ];

        for prepare in states {
            let vault = MemoryVault::new();
            let store = store_with(&vault);
            prepare(&store);
            let before = store.snapshot();

            store.clear();

            let session = store.snapshot();
            assert!(vault.load().unwrap().is_empty());
            assert!(session.user().is_none());
            assert!(session.credentials().is_none());
            assert_eq!(session.loading, before.loading);
            assert_eq!(session.error, before.error);
            assert_invariants(&session);
        }
    }

    #[test]
    fn test_initialized_never_reverts() {
        let store = store_with(&MemoryVault::new());
        assert!(!store.is_initialized());

        store.mark_initialized();
        store.clear();
        store.begin_login();
        store.fail_login("x");
        store.mark_initialized();

        assert!(store.is_initialized());
    }

    #[test]
    fn test_hydrate_loads_pair_without_user() {
        let vault = MemoryVault::with_entries(Some("a1"), Some("r1"));
        let store = store_with(&vault);

        let pair = store.hydrate().unwrap();
        assert_eq!(pair.access(), "a1");

        let session = store.snapshot();
        assert!(session.user().is_none());
        assert_eq!(session.refresh_credential(), Some("r1"));
        assert!(!session.initialized);
    }

    #[test]
    fn test_hydrate_discards_half_pair() {
        let vault = MemoryVault::with_entries(Some("a1"), None);
        let store = store_with(&vault);

        assert!(store.hydrate().is_none());
        assert!(!store.snapshot().is_authenticated());
        assert!(vault.contents().is_empty());
    }

    #[test]
    fn test_hydrate_after_restart() {
        let db = Database::open_in_memory().unwrap();

        let first = SessionStore::new(Arc::new(DatabaseVault::new(db.clone())));
        first.complete_login(user("u1"), CredentialPair::new("a1", "r1"));

        let second = SessionStore::new(Arc::new(DatabaseVault::new(db)));
        assert_eq!(second.hydrate().unwrap().refresh(), "r1");
    }

    #[test]
    fn test_subscribers_see_changes() {
        let store = store_with(&MemoryVault::new());
        let mut rx = store.subscribe();

        store.complete_login(user("u1"), CredentialPair::new("a1", "r1"));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        store.clear();
        assert!(!rx.borrow_and_update().is_authenticated());
    }

    struct BrokenVault;

    impl CredentialVault for BrokenVault {
        fn load(&self) -> crate::Result<StoredCredentials> {
            Err(SessionError::Unavailable("disk gone".to_string()))
        }

        fn store(&self, _pair: &CredentialPair) -> crate::Result<()> {
            Err(SessionError::Unavailable("disk gone".to_string()))
        }

        fn erase(&self) -> crate::Result<()> {
            Err(SessionError::Unavailable("disk gone".to_string()))
        }
    }

    #[test]
    fn test_vault_failures_do_not_break_session() {
        let store = SessionStore::new(Arc::new(BrokenVault));
        assert!(store.hydrate().is_none());

        store.complete_login(user("u1"), CredentialPair::new("a1", "r1"));
        assert!(store.snapshot().is_authenticated());

        store.clear();
        assert!(!store.snapshot().is_authenticated());
    }
}
