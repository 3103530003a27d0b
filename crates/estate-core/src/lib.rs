//! Estate Desk Core
//!
//! Application root for the back-office client. Owns the session store,
//! the request gateway and the resource clients, and runs the startup
//! bootstrap that turns stored credentials back into a session.

mod backoffice;
mod config;
mod error;

pub use backoffice::Backoffice;
pub use config::Config;
pub use error::CoreError;

// Re-export the building blocks
pub use estate_api::{
    Apartment, ApartmentDraft, ApartmentFilters, ApartmentPage, ApiError, DirectoriesApi,
    Directory, DirectoryKind, Furniture, ListingsApi, PageRequest, ProfileApi, Repair, Section,
    UserDraft, UsersApi, ELITE_SERIES, MIN_PASSWORD_LEN,
};
pub use estate_gateway::{
    ApiOutcome, ApiRequest, ApiResponse, AuthError, Failure, Gateway, GatewayError,
    HttpTransport, Transport, TransportError,
};
pub use estate_session::{
    login_redirect, CredentialPair, Decision, Guard, Role, Session, SessionError, SessionStore,
    User,
};
pub use estate_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging. `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
