//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] estate_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] estate_session::SessionError),

    #[error("Authentication error: {0}")]
    Auth(#[from] estate_gateway::AuthError),

    #[error("Transport error: {0}")]
    Transport(#[from] estate_gateway::TransportError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] estate_gateway::GatewayError),

    #[error(transparent)]
    Api(#[from] estate_api::ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Back office not initialized")]
    NotInitialized,

    #[error("Not signed in")]
    NotSignedIn,
}
