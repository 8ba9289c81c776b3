use radgate_common::{ErrorKind, GatewayError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("api key revoked or expired")]
    ApiKeyInactive,
    #[error("api key does not permit api '{0}'")]
    ApiNotAllowed(String),
    #[error("api key does not permit model '{0}'")]
    ModelNotAllowed(String),
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("insufficient role: need at least {need}, have {have}")]
    InsufficientRole { need: String, have: String },
    #[error("too many login attempts, try again later")]
    LockedOut,
    #[error("missing or invalid csrf token")]
    InvalidCsrf,
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        let kind = match err {
            AuthError::MissingCredentials
            | AuthError::InvalidApiKey
            | AuthError::ApiKeyInactive
            | AuthError::InvalidToken
            | AuthError::InvalidCsrf => ErrorKind::Unauthorized,
            AuthError::ApiNotAllowed(_) | AuthError::ModelNotAllowed(_) | AuthError::InsufficientRole { .. } => {
                ErrorKind::Forbidden
            }
            AuthError::LockedOut => ErrorKind::RateLimited,
        };
        GatewayError::new(kind, err.to_string())
    }
}
