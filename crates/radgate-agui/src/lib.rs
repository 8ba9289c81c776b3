//! The AG-UI Event Hub (spec §4.5): SSE fan-out keyed by
//! `(agent_id, thread_id)`, with a bounded, non-blocking per-subscriber
//! queue so one slow client never affects another.

pub mod hub;

pub use hub::{ClientId, EventHub};
