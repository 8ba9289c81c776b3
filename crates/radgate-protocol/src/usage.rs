use serde::{Deserialize, Serialize};

/// Token counts plus optional cost (spec §3). `cost_total` is `None`
/// when no pricing row exists for the model — distinct from a priced
/// cost of zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_total: Option<f64>,
}

impl Usage {
    pub fn zero() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// One row per completed (or failed) gateway request (spec §3). Owned
/// by the Usage Sink once enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: time::OffsetDateTime,
    pub request_id: String,
    pub trace_id: String,
    pub api_key_name: String,
    pub incoming_api: String,
    pub incoming_model: String,
    /// Empty string when the request failed before a candidate won.
    pub selected_model: String,
    pub provider: String,
    pub response_status: ResponseStatus,
    pub duration_ms: u64,
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl UsageRecord {
    pub fn success(
        request_id: String,
        trace_id: String,
        api_key_name: String,
        incoming_api: String,
        incoming_model: String,
        selected_model: String,
        provider: String,
        duration_ms: u64,
        usage: Usage,
    ) -> Self {
        Self {
            timestamp: time::OffsetDateTime::now_utc(),
            request_id,
            trace_id,
            api_key_name,
            incoming_api,
            incoming_model,
            selected_model,
            provider,
            response_status: ResponseStatus::Success,
            duration_ms,
            usage,
            error_kind: None,
            error_message: None,
        }
    }

    pub fn failure(
        request_id: String,
        trace_id: String,
        api_key_name: String,
        incoming_api: String,
        incoming_model: String,
        duration_ms: u64,
        error_kind: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: time::OffsetDateTime::now_utc(),
            request_id,
            trace_id,
            api_key_name,
            incoming_api,
            incoming_model,
            selected_model: String::new(),
            provider: String::new(),
            response_status: ResponseStatus::Error,
            duration_ms,
            usage: Usage::zero(),
            error_kind: Some(error_kind.into()),
            error_message: Some(error_message.into()),
        }
    }
}
