//! HTTP surface: request translation, authentication, dispatch, and
//! response rendering for the gateway's public routes (spec §4, §6).

pub mod auth;
pub mod error;
pub mod handle;
pub mod routes;
pub mod sse;
pub mod state;
pub mod translate;

pub use auth::Principal;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
