use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Ok,
    RetryableError,
    FatalError,
    Timeout,
}

/// One element of the dispatcher's per-request attempt log (spec §3).
/// Emitted regardless of success so post-hoc analysis sees every try,
/// not just the winner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub provider: String,
    pub model: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: time::OffsetDateTime,
    pub duration_ms: u64,
    pub outcome: AttemptOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl Attempt {
    pub fn ok(provider: impl Into<String>, model: impl Into<String>, started_at: time::OffsetDateTime, duration_ms: u64) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            started_at,
            duration_ms,
            outcome: AttemptOutcome::Ok,
            http_status: None,
            error_kind: None,
        }
    }

    pub fn failed(
        provider: impl Into<String>,
        model: impl Into<String>,
        started_at: time::OffsetDateTime,
        duration_ms: u64,
        outcome: AttemptOutcome,
        http_status: Option<u16>,
        error_kind: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            started_at,
            duration_ms,
            outcome,
            http_status,
            error_kind: Some(error_kind.into()),
        }
    }
}
