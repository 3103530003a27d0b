//! Estate Desk Request Gateway
//!
//! Every API call leaves through [`Gateway::send`]:
//! - the current access credential is attached as a bearer token
//! - a 401 triggers at most one refresh-and-retry cycle
//! - an unrecoverable refresh clears the session and hands back the
//!   original 401
//!
//! Login, refresh and profile calls go straight to the [`Transport`] and
//! never re-enter the gateway.

mod auth;
mod error;
mod gateway;
mod outcome;
mod request;
mod transport;

pub use auth::{AuthEndpoints, Authenticator, LoginResponse, DEFAULT_LOGIN_FAILURE};
pub use error::{AuthError, GatewayError, TransportError};
pub use gateway::Gateway;
pub use outcome::{ApiOutcome, Failure};
pub use request::{ApiRequest, ApiResponse};
pub use transport::{HttpTransport, Transport};

pub use reqwest::{Method, StatusCode};

pub type Result<T> = std::result::Result<T, GatewayError>;
