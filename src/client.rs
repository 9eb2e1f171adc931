//! Session-holding client for the ridepool API.
//!
//! [`SessionContext`] owns the persisted session and is cloned into the
//! [`ApiClient`], the [`AuthService`] and the guards, so a 401 observed by any
//! request is visible to every other component immediately.

pub mod api;
pub mod auth;
pub mod booking;
pub mod error;
pub mod guard;
pub mod session;
pub mod transport;

use crate::config::ClientConfig;
use std::sync::Arc;

pub use api::{ApiClient, SearchFilters};
pub use auth::{AuthService, RegisterForm};
pub use booking::BookingForm;
pub use error::ClientError;
pub use guard::{AccessGuard, DEFAULT_LOGIN_ROUTE, GuardDecision, RoleDecision, RoleGate};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionContext, SessionStore};
pub use transport::{ApiRequest, ApiResponse, ApiTransport, HttpMethod, ReqwestTransport};

/// Builds an API client whose session lives in the file named by `config.session_path`.
pub fn file_backed_client(config: &ClientConfig) -> Result<ApiClient, ClientError> {
    let store = FileSessionStore::new(&config.session_path);
    ApiClient::from_config(config, SessionContext::new(Arc::new(store)))
}

#[cfg(test)]
pub(crate) mod testing;
