//! Durable credential storage
//!
//! The vault is read once at startup and written by `complete_login`/`clear`.
//! Writes are last-write-wins; there is only one logical session per client.

use parking_lot::Mutex;
use std::sync::Arc;

use estate_storage::Database;

use crate::session::CredentialPair;
use crate::Result;

pub const ACCESS_TOKEN_KEY: &str = "auth.access_token";
pub const REFRESH_TOKEN_KEY: &str = "auth.refresh_token";

/// Raw vault contents. Either value may be missing after an interrupted
/// write by an older client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl StoredCredentials {
    /// A pair only when both values are present and non-blank.
    pub fn into_pair(self) -> Option<CredentialPair> {
        match (self.access, self.refresh) {
            (Some(access), Some(refresh)) => {
                let pair = CredentialPair::new(access, refresh);
                pair.is_usable().then_some(pair)
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

pub trait CredentialVault: Send + Sync {
    fn load(&self) -> Result<StoredCredentials>;
    fn store(&self, pair: &CredentialPair) -> Result<()>;
    fn erase(&self) -> Result<()>;
}

/// Vault backed by the SQLite settings table.
#[derive(Clone)]
pub struct DatabaseVault {
    db: Database,
}

impl DatabaseVault {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl CredentialVault for DatabaseVault {
    fn load(&self) -> Result<StoredCredentials> {
        Ok(StoredCredentials {
            access: self.db.get_setting(ACCESS_TOKEN_KEY)?,
            refresh: self.db.get_setting(REFRESH_TOKEN_KEY)?,
        })
    }

    fn store(&self, pair: &CredentialPair) -> Result<()> {
        self.db.set_settings(&[
            (ACCESS_TOKEN_KEY, pair.access()),
            (REFRESH_TOKEN_KEY, pair.refresh()),
        ])?;
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        self.db
            .delete_settings(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])?;
        Ok(())
    }
}

/// In-process vault, used as a test double and for ephemeral sessions.
#[derive(Clone, Default)]
pub struct MemoryVault {
    entries: Arc<Mutex<StoredCredentials>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(access: Option<&str>, refresh: Option<&str>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(StoredCredentials {
                access: access.map(str::to_string),
                refresh: refresh.map(str::to_string),
            })),
        }
    }

    pub fn contents(&self) -> StoredCredentials {
        self.entries.lock().clone()
    }
}

impl CredentialVault for MemoryVault {
    fn load(&self) -> Result<StoredCredentials> {
        Ok(self.contents())
    }

    fn store(&self, pair: &CredentialPair) -> Result<()> {
        *self.entries.lock() = StoredCredentials {
            access: Some(pair.access().to_string()),
            refresh: Some(pair.refresh().to_string()),
        };
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        *self.entries.lock() = StoredCredentials::default();
        Ok(())
    }
}
