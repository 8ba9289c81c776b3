use serde::{Deserialize, Serialize};
use std::fmt;

/// The taxonomy from spec §7. Every layer of the gateway (adapter,
/// dispatcher, gateway, auth envelope) classifies its failures into
/// one of these rather than inventing ad-hoc string kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    BadRequest,
    ModelNotFound,
    ModelDisabled,
    RateLimited,
    UpstreamTimeout,
    Upstream5xx,
    Network,
    Decode,
    PricingMissing,
    DispatchFailed,
    Internal,
}

impl ErrorKind {
    /// Maps the taxonomy onto an HTTP status per spec §4.4.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::ModelNotFound | ErrorKind::ModelDisabled => 404,
            ErrorKind::RateLimited => 429,
            ErrorKind::BadRequest | ErrorKind::Decode => 400,
            ErrorKind::UpstreamTimeout | ErrorKind::Upstream5xx | ErrorKind::Network
            | ErrorKind::DispatchFailed => 502,
            ErrorKind::PricingMissing | ErrorKind::Internal => 500,
        }
    }

    /// Whether a dispatcher should try the next candidate after seeing
    /// this kind, per spec §4.3/§7: user-fault kinds never fail over.
    pub fn is_failover_eligible(self) -> bool {
        !matches!(
            self,
            ErrorKind::Unauthorized | ErrorKind::Forbidden | ErrorKind::BadRequest
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::ModelNotFound => "model_not_found",
            ErrorKind::ModelDisabled => "model_disabled",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::UpstreamTimeout => "upstream_timeout",
            ErrorKind::Upstream5xx => "upstream_5xx",
            ErrorKind::Network => "network",
            ErrorKind::Decode => "decode",
            ErrorKind::PricingMissing => "pricing_missing",
            ErrorKind::DispatchFailed => "dispatch_failed",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// The gateway-wide error type. Carries enough to build both the
/// user-visible `{"error": {...}}` body (spec §7) and a UsageRecord's
/// `error_kind`/`error_message` pair.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider: None,
            http_status: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// HTTP status to use in the response: explicit override if set,
    /// else derived from `kind`.
    pub fn status(&self) -> u16 {
        self.http_status.unwrap_or_else(|| self.kind.http_status())
    }

    /// Renders the `{"error": {"message", "code", "kind"}}` body spec
    /// §7 specifies for user-visible error responses.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "message": self.message,
                "code": self.status(),
                "kind": self.kind.to_string(),
            }
        })
    }
}
