//! Estate Desk Session Management
//!
//! - One process-wide [`Session`], owned by the application root and passed
//!   around as a cloneable [`SessionStore`] handle
//! - Credentials are persisted through a [`CredentialVault`] and read once
//!   at startup
//! - Access credential and refresh credential are stored as one pair, so a
//!   half session cannot exist in memory
//! - Route gating reads the session through [`Guard`]

mod access;
mod error;
mod session;
mod store;
mod vault;

pub use access::{login_redirect, Decision, Guard};
pub use error::SessionError;
pub use session::{CredentialPair, Role, Session, User};
pub use store::SessionStore;
pub use vault::{
    CredentialVault, DatabaseVault, MemoryVault, StoredCredentials, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};

pub type Result<T> = std::result::Result<T, SessionError>;
