//! The Dispatcher (spec §4.3): stateless candidate iteration over a
//! primary model plus its ordered fallbacks, building the per-request
//! `Attempt` log. Per-candidate retries belong to the adapter; this
//! crate only fails over between distinct candidates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use radgate_common::{ErrorKind, GatewayError};
use radgate_protocol::{Attempt, AttemptOutcome, ProviderRequest, ProviderResult};
use radgate_provider_core::ProviderAdapter;
use tokio::sync::watch;
use tokio::time::Instant;

/// One candidate in the failover chain: primary first, then
/// fallbacks in descending-weight order.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub provider: String,
    pub provider_model: String,
}

pub struct DispatchInput {
    pub request: ProviderRequest,
    pub candidates: Vec<Candidate>,
    pub deadline: Duration,
    /// Caller cancellation; when this flips to `true` the dispatcher
    /// stops trying further candidates (spec §4.3/§5).
    pub cancel: watch::Receiver<bool>,
}

pub struct DispatchOutcome {
    pub result: ProviderResult,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("dispatch failed after {attempts} attempt(s): {last}")]
pub struct DispatchFailed {
    pub attempts: usize,
    pub last: GatewayError,
}

/// Registry of adapters keyed by provider name, as configured by
/// `apps/radgate`'s bootstrap.
pub type AdapterRegistry = HashMap<String, Arc<dyn ProviderAdapter>>;

/// Runs the candidate list in order against `adapters`, returning the
/// first success or an aggregated `dispatch_failed` error carrying the
/// full attempt log (spec §4.3).
pub async fn dispatch(
    adapters: &AdapterRegistry,
    input: DispatchInput,
) -> Result<DispatchOutcome, (GatewayError, Vec<Attempt>)> {
    let mut attempts = Vec::with_capacity(input.candidates.len());
    let deadline = Instant::now() + input.deadline;
    let mut cancel = input.cancel;

    let mut last_err: Option<GatewayError> = None;

    for candidate in &input.candidates {
        if *cancel.borrow() {
            let err = GatewayError::new(ErrorKind::DispatchFailed, "cancelled before candidate attempted");
            return Err((err, attempts));
        }

        let Some(adapter) = adapters.get(&candidate.provider) else {
            let started_at = time::OffsetDateTime::now_utc();
            attempts.push(Attempt::failed(
                candidate.provider.clone(),
                candidate.provider_model.clone(),
                started_at,
                0,
                AttemptOutcome::FatalError,
                None,
                ErrorKind::Internal.to_string(),
            ));
            last_err = Some(GatewayError::new(
                ErrorKind::Internal,
                format!("no adapter registered for provider '{}'", candidate.provider),
            ));
            continue;
        };

        let started = Instant::now();
        let started_at = time::OffsetDateTime::now_utc();

        let remaining = deadline.saturating_duration_since(Instant::now());
        let outcome = tokio::select! {
            biased;
            _ = cancel.changed() => {
                let err = GatewayError::new(ErrorKind::DispatchFailed, "cancelled mid-flight");
                attempts.push(Attempt::failed(
                    candidate.provider.clone(),
                    candidate.provider_model.clone(),
                    started_at,
                    started.elapsed().as_millis() as u64,
                    AttemptOutcome::Timeout,
                    None,
                    err.kind.to_string(),
                ));
                return Err((err, attempts));
            }
            res = tokio::time::timeout(remaining, adapter.execute(input.request.clone(), &candidate.provider_model)) => res,
        };

        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(result)) => {
                attempts.push(Attempt::ok(
                    candidate.provider.clone(),
                    candidate.provider_model.clone(),
                    started_at,
                    duration_ms,
                ));
                return Ok(DispatchOutcome { result, attempts });
            }
            Ok(Err(err)) => {
                let fatal_no_failover = matches!(err.kind, ErrorKind::Unauthorized | ErrorKind::BadRequest);
                let attempt_outcome = if err.kind.is_failover_eligible() {
                    AttemptOutcome::RetryableError
                } else {
                    AttemptOutcome::FatalError
                };
                attempts.push(Attempt::failed(
                    candidate.provider.clone(),
                    candidate.provider_model.clone(),
                    started_at,
                    duration_ms,
                    attempt_outcome,
                    err.http_status,
                    err.kind.to_string(),
                ));
                if fatal_no_failover {
                    return Err((err, attempts));
                }
                last_err = Some(err);
            }
            Err(_elapsed) => {
                let err = GatewayError::new(ErrorKind::UpstreamTimeout, "candidate deadline exceeded")
                    .with_provider(candidate.provider.clone());
                attempts.push(Attempt::failed(
                    candidate.provider.clone(),
                    candidate.provider_model.clone(),
                    started_at,
                    duration_ms,
                    AttemptOutcome::Timeout,
                    None,
                    err.kind.to_string(),
                ));
                last_err = Some(err);
            }
        }
    }

    let last = last_err.unwrap_or_else(|| GatewayError::new(ErrorKind::DispatchFailed, "no candidates to try"));
    let aggregated = GatewayError::new(
        ErrorKind::DispatchFailed,
        format!("all {} candidate(s) exhausted: {}", attempts.len(), last.message),
    );
    Err((aggregated, attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use radgate_protocol::{Choice, MessageRole, ApiType, RequestPayload, ResponseOutput, Usage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysOk;

    #[async_trait]
    impl ProviderAdapter for AlwaysOk {
        fn name(&self) -> &str {
            "ok"
        }
        async fn execute(&self, _req: ProviderRequest, model: &str) -> Result<ProviderResult, GatewayError> {
            Ok(ProviderResult {
                provider: "ok".into(),
                model: model.into(),
                output: ResponseOutput::Materialized(vec![Choice {
                    index: 0,
                    role: MessageRole::Assistant,
                    message: radgate_protocol::ChatMessage::text(MessageRole::Assistant, "hi"),
                    finish_reason: Some("stop".into()),
                }]),
                usage: Usage::zero(),
            })
        }
    }

    struct AlwaysUnauthorized(AtomicUsize);

    #[async_trait]
    impl ProviderAdapter for AlwaysUnauthorized {
        fn name(&self) -> &str {
            "bad"
        }
        async fn execute(&self, _req: ProviderRequest, _model: &str) -> Result<ProviderResult, GatewayError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::new(ErrorKind::Unauthorized, "nope"))
        }
    }

    struct AlwaysRateLimited(AtomicUsize);

    #[async_trait]
    impl ProviderAdapter for AlwaysRateLimited {
        fn name(&self) -> &str {
            "rl"
        }
        async fn execute(&self, _req: ProviderRequest, _model: &str) -> Result<ProviderResult, GatewayError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::new(ErrorKind::RateLimited, "slow down"))
        }
    }

    fn sample_request() -> ProviderRequest {
        ProviderRequest { api_type: ApiType::Chat, model: "m".into(), payload: RequestPayload::default() }
    }

    #[tokio::test]
    async fn succeeds_on_first_candidate() {
        let mut adapters: AdapterRegistry = HashMap::new();
        adapters.insert("ok".into(), Arc::new(AlwaysOk));
        let (_tx, rx) = watch::channel(false);
        let input = DispatchInput {
            request: sample_request(),
            candidates: vec![Candidate { provider: "ok".into(), provider_model: "m".into() }],
            deadline: Duration::from_secs(5),
            cancel: rx,
        };
        let outcome = dispatch(&adapters, input).await.unwrap();
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].outcome, AttemptOutcome::Ok);
    }

    #[tokio::test]
    async fn unauthorized_does_not_fail_over() {
        let mut adapters: AdapterRegistry = HashMap::new();
        let calls = Arc::new(AtomicUsize::new(0));
        adapters.insert("bad".into(), Arc::new(AlwaysUnauthorized(AtomicUsize::new(0))));
        adapters.insert("ok".into(), Arc::new(AlwaysOk));
        let (_tx, rx) = watch::channel(false);
        let input = DispatchInput {
            request: sample_request(),
            candidates: vec![
                Candidate { provider: "bad".into(), provider_model: "m".into() },
                Candidate { provider: "ok".into(), provider_model: "m".into() },
            ],
            deadline: Duration::from_secs(5),
            cancel: rx,
        };
        let result = dispatch(&adapters, input).await;
        assert!(result.is_err());
        let (err, attempts) = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(attempts.len(), 1);
        let _ = calls;
    }

    #[tokio::test]
    async fn rate_limited_fails_over_to_next_candidate() {
        let mut adapters: AdapterRegistry = HashMap::new();
        adapters.insert("rl".into(), Arc::new(AlwaysRateLimited(AtomicUsize::new(0))));
        adapters.insert("ok".into(), Arc::new(AlwaysOk));
        let (_tx, rx) = watch::channel(false);
        let input = DispatchInput {
            request: sample_request(),
            candidates: vec![
                Candidate { provider: "rl".into(), provider_model: "m".into() },
                Candidate { provider: "ok".into(), provider_model: "m".into() },
            ],
            deadline: Duration::from_secs(5),
            cancel: rx,
        };
        let outcome = dispatch(&adapters, input).await.unwrap();
        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(outcome.attempts[0].outcome, AttemptOutcome::RetryableError);
        assert_eq!(outcome.attempts[1].outcome, AttemptOutcome::Ok);
    }

    #[tokio::test]
    async fn exhausting_all_candidates_yields_dispatch_failed() {
        let mut adapters: AdapterRegistry = HashMap::new();
        adapters.insert("rl".into(), Arc::new(AlwaysRateLimited(AtomicUsize::new(0))));
        let (_tx, rx) = watch::channel(false);
        let input = DispatchInput {
            request: sample_request(),
            candidates: vec![Candidate { provider: "rl".into(), provider_model: "m".into() }],
            deadline: Duration::from_secs(5),
            cancel: rx,
        };
        let (err, attempts) = dispatch(&adapters, input).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DispatchFailed);
        assert_eq!(attempts.len(), 1);
    }
}
