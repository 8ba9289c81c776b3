use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::Serialize;
use time::OffsetDateTime;

/// Default capacity of the in-memory trace ring (spec §4.7).
pub const DEFAULT_CAPACITY: usize = 10_000;

/// One free-form debugging event attached to a trace (spec §4.7).
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub trace_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub message: String,
    pub fields: HashMap<String, String>,
}

struct Inner {
    order: VecDeque<u64>,
    events: HashMap<u64, TraceEvent>,
    by_trace: HashMap<String, Vec<u64>>,
    next_id: u64,
    capacity: usize,
}

impl Inner {
    fn evict_oldest(&mut self) {
        if let Some(id) = self.order.pop_front() {
            if let Some(event) = self.events.remove(&id) {
                if let Some(ids) = self.by_trace.get_mut(&event.trace_id) {
                    ids.retain(|existing| *existing != id);
                    if ids.is_empty() {
                        self.by_trace.remove(&event.trace_id);
                    }
                }
            }
        }
    }
}

/// Bounded FIFO ring of trace events, indexed by `trace_id` (spec
/// §4.7). Used by the debug/trace admin endpoints to reconstruct what
/// happened for a single request, independent of the usage sink.
#[derive(Clone)]
pub struct TraceStore {
    inner: std::sync::Arc<Mutex<Inner>>,
}

impl TraceStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(Inner {
                order: VecDeque::new(),
                events: HashMap::new(),
                by_trace: HashMap::new(),
                next_id: 0,
                capacity,
            })),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Appends an event, evicting the oldest event in the ring if the
    /// store is at capacity.
    pub fn record(&self, trace_id: impl Into<String>, message: impl Into<String>, fields: HashMap<String, String>) {
        let trace_id = trace_id.into();
        let mut guard = self.inner.lock().expect("trace store lock poisoned");
        if guard.order.len() >= guard.capacity {
            guard.evict_oldest();
        }
        let id = guard.next_id;
        guard.next_id += 1;
        let event = TraceEvent { trace_id: trace_id.clone(), timestamp: OffsetDateTime::now_utc(), message: message.into(), fields };
        guard.order.push_back(id);
        guard.events.insert(id, event);
        guard.by_trace.entry(trace_id).or_default().push(id);
    }

    /// Returns every still-retained event for `trace_id`, in the order
    /// they were recorded.
    pub fn get(&self, trace_id: &str) -> Vec<TraceEvent> {
        let guard = self.inner.lock().expect("trace store lock poisoned");
        match guard.by_trace.get(trace_id) {
            Some(ids) => ids.iter().filter_map(|id| guard.events.get(id).cloned()).collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("trace store lock poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_retrieves_in_order() {
        let store = TraceStore::new(100);
        store.record("trace-1", "router resolved", HashMap::new());
        store.record("trace-1", "dispatch attempt 1", HashMap::new());
        store.record("trace-2", "unrelated", HashMap::new());

        let events = store.get("trace-1");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "router resolved");
        assert_eq!(events[1].message, "dispatch attempt 1");
    }

    #[test]
    fn evicts_oldest_event_at_capacity() {
        let store = TraceStore::new(2);
        store.record("trace-1", "first", HashMap::new());
        store.record("trace-1", "second", HashMap::new());
        store.record("trace-2", "third", HashMap::new());

        assert_eq!(store.len(), 2);
        let trace_1_events = store.get("trace-1");
        assert_eq!(trace_1_events.len(), 1);
        assert_eq!(trace_1_events[0].message, "second");
        assert_eq!(store.get("trace-2").len(), 1);
    }

    #[test]
    fn unknown_trace_returns_empty() {
        let store = TraceStore::new(10);
        assert!(store.get("nope").is_empty());
    }
}
