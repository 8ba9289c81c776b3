//! Usage accounting and trace debugging (spec §4.7): a bounded,
//! non-blocking usage sink backed by a background batch consumer, and
//! a bounded trace event ring keyed by trace id.

pub mod trace_store;
pub mod usage_sink;

pub use trace_store::{TraceEvent, TraceStore};
pub use usage_sink::{TracingUsageConsumer, UsageConsumer, UsageSink};
