//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] estate_storage::StorageError),

    #[error("Credential vault unavailable: {0}")]
    Unavailable(String),
}
