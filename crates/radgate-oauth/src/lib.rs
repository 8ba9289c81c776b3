//! OAuth Session Manager (spec §4.8): a pending-session table for
//! external OAuth flows, indexed by state, with code exchange, refresh,
//! and a background expiry janitor. Only the session-lifecycle contract
//! lives here; vendor-specific device-code dances stay out of scope.

pub mod error;
pub mod manager;
pub mod provider;
pub mod session;

pub use error::OAuthError;
pub use manager::{OAuthManager, DEFAULT_PENDING_TTL};
pub use provider::{OAuthProvider, StaticProvider};
pub use session::{OAuthToken, Session, SessionStatus};
