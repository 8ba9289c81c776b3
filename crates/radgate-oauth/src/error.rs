use radgate_common::{ErrorKind, GatewayError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum OAuthError {
    #[error("unknown oauth provider: {0}")]
    UnknownProvider(String),
    #[error("unknown oauth session")]
    UnknownSession,
    #[error("oauth session expired")]
    SessionExpired,
    #[error("oauth state does not match session")]
    StateMismatch,
    #[error("authorization code is empty")]
    InvalidCode,
    #[error("refresh token is empty or unrecognized")]
    InvalidRefreshToken,
    #[error("upstream oauth exchange failed: {0}")]
    Upstream(String),
}

impl From<OAuthError> for GatewayError {
    fn from(err: OAuthError) -> Self {
        let kind = match &err {
            OAuthError::UnknownProvider(_) | OAuthError::InvalidCode | OAuthError::InvalidRefreshToken => ErrorKind::BadRequest,
            OAuthError::UnknownSession | OAuthError::StateMismatch => ErrorKind::Unauthorized,
            OAuthError::SessionExpired => ErrorKind::Unauthorized,
            OAuthError::Upstream(_) => ErrorKind::Upstream5xx,
        };
        GatewayError::new(kind, err.to_string())
    }
}
