use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use radgate_protocol::UsageRecord;

/// Consumes flushed batches, e.g. writing them to durable storage.
/// `radgate-telemetry` ships a logging default; `apps/radgate`'s
/// bootstrap may wire a real one.
pub trait UsageConsumer: Send + Sync {
    fn flush(&self, batch: Vec<UsageRecord>);
}

/// Logs the batch size at debug level. The default consumer when no
/// durable spill is configured.
#[derive(Debug, Default)]
pub struct TracingUsageConsumer;

impl UsageConsumer for TracingUsageConsumer {
    fn flush(&self, batch: Vec<UsageRecord>) {
        if !batch.is_empty() {
            tracing::debug!(count = batch.len(), "flushed usage batch");
        }
    }
}

struct Inner {
    queue: Mutex<VecDeque<UsageRecord>>,
    capacity: usize,
    dropped: AtomicU64,
}

/// Bounded, non-blocking usage accounting sink (spec §4.7). `add` never
/// blocks the request path: once the queue is at capacity the oldest
/// record is dropped and a counter incremented, never the record
/// being added. A background task periodically drains batches to a
/// `UsageConsumer`.
#[derive(Clone)]
pub struct UsageSink {
    inner: Arc<Inner>,
}

impl UsageSink {
    /// Spawns the background flusher immediately; the returned value
    /// keeps the sink alive for as long as the app needs it (the task
    /// itself runs detached on the current Tokio runtime).
    pub fn spawn(capacity: usize, flush_interval: Duration, consumer: Arc<dyn UsageConsumer>, batch_size: usize) -> Self {
        let inner = Arc::new(Inner { queue: Mutex::new(VecDeque::with_capacity(capacity)), capacity, dropped: AtomicU64::new(0) });
        let sink = Self { inner: inner.clone() };

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(flush_interval);
            loop {
                ticker.tick().await;
                let batch = {
                    let mut guard = inner.queue.lock().expect("usage queue lock poisoned");
                    let take = batch_size.min(guard.len());
                    guard.drain(..take).collect::<Vec<_>>()
                };
                if !batch.is_empty() {
                    consumer.flush(batch);
                }
            }
        });

        sink
    }

    /// Enqueues a record without blocking (spec §4.7). Drops the
    /// oldest queued record, not the new one, when at capacity.
    pub fn add(&self, record: UsageRecord) {
        let mut guard = self.inner.queue.lock().expect("usage queue lock poisoned");
        if guard.len() >= self.inner.capacity {
            guard.pop_front();
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
        }
        guard.push_back(record);
    }

    pub fn queued_len(&self) -> usize {
        self.inner.queue.lock().expect("usage queue lock poisoned").len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radgate_protocol::Usage;

    fn sample(request_id: &str) -> UsageRecord {
        UsageRecord::success(
            request_id.to_string(),
            "trace-1".into(),
            "rad_demo".into(),
            "chat".into(),
            "gpt-4o".into(),
            "gpt-4o".into(),
            "openai".into(),
            10,
            Usage::zero(),
        )
    }

    #[test]
    fn add_never_blocks_and_drops_oldest_at_capacity() {
        let inner = Inner { queue: Mutex::new(VecDeque::new()), capacity: 2, dropped: AtomicU64::new(0) };
        let sink = UsageSink { inner: Arc::new(inner) };
        sink.add(sample("r1"));
        sink.add(sample("r2"));
        sink.add(sample("r3"));
        assert_eq!(sink.queued_len(), 2);
        assert_eq!(sink.dropped_count(), 1);
    }

    #[tokio::test]
    async fn background_task_flushes_batches() {
        struct Counting(Arc<AtomicU64>);
        impl UsageConsumer for Counting {
            fn flush(&self, batch: Vec<UsageRecord>) {
                self.0.fetch_add(batch.len() as u64, Ordering::Relaxed);
            }
        }
        let count = Arc::new(AtomicU64::new(0));
        let sink = UsageSink::spawn(100, Duration::from_millis(10), Arc::new(Counting(count.clone())), 50);
        sink.add(sample("r1"));
        sink.add(sample("r2"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }
}
