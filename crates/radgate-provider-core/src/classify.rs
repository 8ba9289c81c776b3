use std::time::Duration;

use rand::Rng;
use radgate_common::ErrorKind;

/// What the transport layer actually saw, before it is turned into a
/// `GatewayError` (spec §4.1).
#[derive(Debug, Clone)]
pub enum UpstreamOutcome {
    Http { status: u16, body_snippet: String },
    Timeout,
    Network { message: String },
    Decode { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Fatal,
}

impl UpstreamOutcome {
    /// Classifies the outcome per spec §4.1: 429/5xx/network/timeout
    /// are retryable; 400/401/403/404/422 are fatal.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            UpstreamOutcome::Http { status, .. } => match *status {
                429 => RetryClass::Retryable,
                s if s >= 500 => RetryClass::Retryable,
                400 | 401 | 403 | 404 | 422 => RetryClass::Fatal,
                _ => RetryClass::Fatal,
            },
            UpstreamOutcome::Timeout | UpstreamOutcome::Network { .. } => RetryClass::Retryable,
            UpstreamOutcome::Decode { .. } => RetryClass::Fatal,
        }
    }

    pub fn error_kind(&self) -> ErrorKind {
        match self {
            UpstreamOutcome::Http { status: 429, .. } => ErrorKind::RateLimited,
            UpstreamOutcome::Http { status: 401, .. } => ErrorKind::Unauthorized,
            UpstreamOutcome::Http { status: 403, .. } => ErrorKind::Forbidden,
            UpstreamOutcome::Http { status: 400, .. } | UpstreamOutcome::Http { status: 422, .. } => {
                ErrorKind::BadRequest
            }
            UpstreamOutcome::Http { status: 404, .. } => ErrorKind::ModelNotFound,
            UpstreamOutcome::Http { status, .. } if *status >= 500 => ErrorKind::Upstream5xx,
            UpstreamOutcome::Http { .. } => ErrorKind::BadRequest,
            UpstreamOutcome::Timeout => ErrorKind::UpstreamTimeout,
            UpstreamOutcome::Network { .. } => ErrorKind::Network,
            UpstreamOutcome::Decode { .. } => ErrorKind::Decode,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            UpstreamOutcome::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Exponential backoff with jitter, capped at 8s (spec §4.1):
/// `delay = base * 2^attempt`, clamped, plus up to 20% jitter.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(200),
            cap: Duration::from_secs(8),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let capped = exp.min(self.cap);
        let jitter_frac: f64 = rand::rng().random_range(0.0..0.2);
        capped.mul_f64(1.0 + jitter_frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_server_errors_as_retryable() {
        let outcome = UpstreamOutcome::Http { status: 503, body_snippet: String::new() };
        assert_eq!(outcome.retry_class(), RetryClass::Retryable);
        assert_eq!(outcome.error_kind(), ErrorKind::Upstream5xx);
    }

    #[test]
    fn classifies_unauthorized_as_fatal() {
        let outcome = UpstreamOutcome::Http { status: 401, body_snippet: String::new() };
        assert_eq!(outcome.retry_class(), RetryClass::Fatal);
        assert_eq!(outcome.error_kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn backoff_caps_at_8_seconds() {
        let policy = BackoffPolicy::default();
        let delay = policy.delay_for_attempt(20);
        assert!(delay <= Duration::from_secs(8).mul_f64(1.2));
    }

    #[test]
    fn backoff_grows_with_attempt() {
        let policy = BackoffPolicy::default();
        assert!(policy.delay_for_attempt(0) < policy.delay_for_attempt(3));
    }
}
