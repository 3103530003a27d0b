//! Estate Desk API Clients
//!
//! Typed access to the back-office resources. Every call goes through the
//! shared [`estate_gateway::Gateway`], so credential refresh is invisible
//! here; a 401 that reaches this layer means the session is gone.

mod call;
mod directory;
mod error;
mod listing;
mod user;

pub use directory::{DirectoriesApi, Directory, DirectoryKind};
pub use error::ApiError;
pub use listing::{
    Apartment, ApartmentDraft, ApartmentFilters, ApartmentPage, Furniture, ListingsApi,
    PageRequest, Repair, Section, ELITE_SERIES,
};
pub use user::{ProfileApi, UserDraft, UsersApi, MIN_PASSWORD_LEN};

pub type Result<T> = std::result::Result<T, ApiError>;
