//! Shared leaf types used across the radgate workspace: the error
//! taxonomy, correlation ids, and RFC3339 timestamp helpers.
//!
//! This crate intentionally depends on nothing beyond `serde`/`time`/
//! `uuid` — every other crate in the workspace may depend on it.

pub mod error;
pub mod ids;
pub mod time_fmt;

pub use error::{ErrorKind, GatewayError};
pub use ids::{new_request_id, new_trace_id};
