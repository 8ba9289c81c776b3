use std::collections::HashMap;
use std::sync::RwLock;

use radgate_protocol::AgUiEvent;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Bounded per-subscriber outgoing queue (spec §4.5).
const SUBSCRIBER_QUEUE_CAPACITY: usize = 100;

pub type ClientId = String;

struct Client {
    agent_id: String,
    thread_id: String,
    sender: mpsc::Sender<AgUiEvent>,
}

/// Keyed `(agent_id, thread_id)` subscriber registry (spec §4.5),
/// generalized from `gproxy_provider_core::events::EventHub`'s single
/// `broadcast::Sender` (which drops for *every* slow receiver at
/// once) to one bounded `mpsc` channel per client, so a full queue
/// only ever drops events for that one subscriber (spec §4.5/§5,
/// §8's backpressure-isolation property).
#[derive(Clone)]
pub struct EventHub {
    clients: std::sync::Arc<RwLock<HashMap<ClientId, Client>>>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self { clients: std::sync::Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Registers a new subscriber for `(agent_id, thread_id)` and
    /// immediately enqueues the synthetic `state.snapshot` connect
    /// event (spec §4.5). `thread_id` of `""` subscribes to every
    /// thread under the agent.
    pub fn subscribe(&self, agent_id: impl Into<String>, thread_id: impl Into<String>) -> (ClientId, mpsc::Receiver<AgUiEvent>) {
        let agent_id = agent_id.into();
        let thread_id = thread_id.into();
        let client_id = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);

        let connect_event = AgUiEvent::connected(agent_id.clone(), &client_id);
        let _ = sender.try_send(connect_event);

        self.clients.write().expect("event hub lock poisoned").insert(
            client_id.clone(),
            Client { agent_id, thread_id, sender },
        );
        (client_id, receiver)
    }

    /// Removes a subscriber on disconnect (client close, cancellation,
    /// or write error — spec §4.5).
    pub fn unsubscribe(&self, client_id: &str) {
        self.clients.write().expect("event hub lock poisoned").remove(client_id);
    }

    /// Delivers `event` to every matching subscriber, non-blocking
    /// (spec §4.5): skip clients on a different agent; if
    /// `event.thread_id` is empty, deliver to every client on that
    /// agent; otherwise only to clients with a matching thread. A full
    /// queue drops the event for that subscriber only.
    pub fn broadcast(&self, event: AgUiEvent) {
        let guard = self.clients.read().expect("event hub lock poisoned");
        for (client_id, client) in guard.iter() {
            if client.agent_id != event.agent_id {
                continue;
            }
            if !event.thread_id.is_empty() && client.thread_id != event.thread_id {
                continue;
            }
            if let Err(mpsc::error::TrySendError::Full(_)) = client.sender.try_send(event.clone()) {
                tracing::warn!(client_id = %client_id, agent_id = %event.agent_id, "dropping agui event: subscriber queue full");
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.clients.read().expect("event hub lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radgate_protocol::AgUiEventKind;

    fn event(agent: &str, thread: &str) -> AgUiEvent {
        AgUiEvent::new(AgUiEventKind::MessageDelta, "run-1", agent).with_thread(thread)
    }

    #[tokio::test]
    async fn broadcast_isolated_by_agent() {
        let hub = EventHub::new();
        let (_id_a, mut rx_a) = hub.subscribe("agent-a", "");
        let (_id_b, mut rx_b) = hub.subscribe("agent-b", "");
        rx_a.recv().await.unwrap();
        rx_b.recv().await.unwrap();

        hub.broadcast(event("agent-a", ""));

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn thread_filtering_delivers_only_to_matching_subscriber() {
        let hub = EventHub::new();
        let (_id_t1, mut rx_t1) = hub.subscribe("agent-a", "thread-1");
        let (_id_t2, mut rx_t2) = hub.subscribe("agent-a", "thread-2");
        rx_t1.recv().await.unwrap();
        rx_t2.recv().await.unwrap();

        hub.broadcast(event("agent-a", "thread-1"));

        assert!(rx_t1.try_recv().is_ok());
        assert!(rx_t2.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_thread_id_broadcasts_to_all_agent_subscribers() {
        let hub = EventHub::new();
        let (_id_t1, mut rx_t1) = hub.subscribe("agent-a", "thread-1");
        let (_id_t2, mut rx_t2) = hub.subscribe("agent-a", "thread-2");
        rx_t1.recv().await.unwrap();
        rx_t2.recv().await.unwrap();

        hub.broadcast(event("agent-a", ""));

        assert!(rx_t1.try_recv().is_ok());
        assert!(rx_t2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn full_queue_drops_only_for_that_subscriber() {
        let hub = EventHub::new();
        let (_slow_id, mut slow_rx) = hub.subscribe("agent-a", "");
        let (_fast_id, mut fast_rx) = hub.subscribe("agent-a", "");
        slow_rx.recv().await.unwrap();
        fast_rx.recv().await.unwrap();

        let mut fast_count = 0;
        for _ in 0..(SUBSCRIBER_QUEUE_CAPACITY + 10) {
            // slow_rx is never drained here; fast_rx drains every time,
            // simulating one slow subscriber and one keeping up.
            hub.broadcast(event("agent-a", ""));
            if fast_rx.try_recv().is_ok() {
                fast_count += 1;
            }
        }

        assert!(fast_count > 0);
        let mut slow_count = 0;
        while slow_rx.try_recv().is_ok() {
            slow_count += 1;
        }
        assert!(slow_count <= SUBSCRIBER_QUEUE_CAPACITY);
    }

    #[tokio::test]
    async fn unsubscribe_removes_client() {
        let hub = EventHub::new();
        let (client_id, _rx) = hub.subscribe("agent-a", "");
        assert_eq!(hub.subscriber_count(), 1);
        hub.unsubscribe(&client_id);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
