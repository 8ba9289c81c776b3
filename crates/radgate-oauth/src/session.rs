use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Session lifecycle (spec §3/§4.8): created pending on `Start`,
/// transitions to `connected` on successful code exchange or `failed`
/// on error; pending sessions auto-expire after 10 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Connected,
    Failed,
    Expired,
}

/// An issued OAuth token pair, stored on a connected session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl OAuthToken {
    /// A token is treated as expired 60 seconds before its actual
    /// expiry (spec §3's "exp minus 60s skew").
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at - time::Duration::seconds(60)
    }
}

/// One external OAuth flow (spec §3/§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub provider: String,
    pub state: String,
    pub auth_url: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<OAuthToken>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub redirect_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Session {
    pub fn is_pending_expired(&self, pending_ttl: time::Duration) -> bool {
        self.status == SessionStatus::Pending && OffsetDateTime::now_utc() >= self.created_at + pending_ttl
    }

    pub fn is_connected_expired(&self) -> bool {
        if self.status != SessionStatus::Connected {
            return false;
        }
        match &self.token {
            Some(token) => token.is_expired(),
            None => true,
        }
    }
}
