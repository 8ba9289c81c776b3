use std::time::Duration;

use radgate_common::GatewayError;
use radgate_provider_core::{BackoffPolicy, RetryClass, UpstreamOutcome};
use wreq::Client;

/// Builds the shared pooled client every adapter instance holds one
/// of (spec §4.1: "connection pool reused across calls").
pub fn build_client(connect_timeout: Duration, request_timeout: Duration) -> Result<Client, wreq::Error> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
}

/// Maps a `wreq` transport failure onto the spec §4.1 retry
/// classification. Timeouts and connect/DNS/TLS failures are
/// `Network`/`Timeout`; everything else surfaces as a bare network
/// failure so the caller still fails over.
pub fn classify_wreq_error(err: &wreq::Error) -> UpstreamOutcome {
    if err.is_timeout() {
        return UpstreamOutcome::Timeout;
    }
    UpstreamOutcome::Network { message: err.to_string() }
}

/// Turns a classified transport outcome into the adapter's final
/// `GatewayError`, once retries are exhausted (spec §4.1's error
/// shape: `{kind, message, provider, http_status?}`).
pub fn outcome_to_gateway_error(outcome: &UpstreamOutcome, provider: &str) -> GatewayError {
    let message = match outcome {
        UpstreamOutcome::Http { body_snippet, .. } => body_snippet.clone(),
        UpstreamOutcome::Timeout => "upstream request timed out".to_string(),
        UpstreamOutcome::Network { message } => message.clone(),
        UpstreamOutcome::Decode { message } => message.clone(),
    };
    let mut err = GatewayError::new(outcome.error_kind(), message).with_provider(provider.to_string());
    if let Some(status) = outcome.http_status() {
        err = err.with_status(status);
    }
    err
}

/// Resends the same candidate on a retryable outcome, up to
/// `max_retries` times, sleeping `BackoffPolicy::delay_for_attempt`
/// between tries (spec §4.1: "at most `max_retries` re-sends of the
/// *same* candidate"; §4.3: per-candidate retries are owned by the
/// adapter, not the dispatcher).
pub async fn with_retries<T, F, Fut>(max_retries: u32, mut attempt_fn: F) -> Result<T, UpstreamOutcome>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, UpstreamOutcome>>,
{
    let backoff = BackoffPolicy::default();
    let mut attempt = 0u32;
    loop {
        match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(outcome) => {
                let retryable = outcome.retry_class() == RetryClass::Retryable;
                if !retryable || attempt >= max_retries {
                    return Err(outcome);
                }
                let delay = backoff.delay_for_attempt(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying candidate after retryable upstream error");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retrying_on_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, UpstreamOutcome> = with_retries(2, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7u32) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_a_retryable_outcome_up_to_max_retries_then_gives_up() {
        let calls = AtomicU32::new(0);
        let result: Result<(), UpstreamOutcome> = with_retries(2, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(UpstreamOutcome::Timeout) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3, "initial attempt plus 2 retries");
    }

    #[tokio::test]
    async fn does_not_retry_a_fatal_outcome() {
        let calls = AtomicU32::new(0);
        let result: Result<(), UpstreamOutcome> = with_retries(5, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(UpstreamOutcome::Http { status: 401, body_snippet: "nope".into() }) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
