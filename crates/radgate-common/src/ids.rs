use uuid::Uuid;

/// A fresh request-scoped correlation id (spec §3's `Fingerprint`).
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// A fresh trace id for distributed-tracing correlation.
pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}
