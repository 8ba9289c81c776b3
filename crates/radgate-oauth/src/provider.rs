use crate::error::OAuthError;
use crate::session::OAuthToken;

/// A vendor IdP the manager can exchange codes and refresh tokens
/// against (spec §4.8). Only the session-lifecycle contract lives
/// here; vendor-specific device-code dances are out of scope.
#[async_trait::async_trait]
pub trait OAuthProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Builds the URL the caller should redirect the end user to,
    /// interpolating `state`.
    fn auth_url(&self, redirect_uri: &str, state: &str) -> String;

    /// Exchanges an authorization code for a token.
    async fn exchange_code(&self, redirect_uri: &str, code: &str) -> Result<OAuthToken, OAuthError>;

    /// Refreshes an existing token.
    async fn refresh(&self, refresh_token: &str) -> Result<OAuthToken, OAuthError>;
}

/// Deterministic, hermetic provider for tests and local development
/// (spec §9): synthesizes tokens without contacting any real IdP. Gated
/// on explicit configuration, never the default in production.
pub struct StaticProvider {
    name: String,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait::async_trait]
impl OAuthProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn auth_url(&self, redirect_uri: &str, state: &str) -> String {
        format!("https://static.invalid/{}/authorize?redirect_uri={}&state={}", self.name, redirect_uri, state)
    }

    async fn exchange_code(&self, _redirect_uri: &str, code: &str) -> Result<OAuthToken, OAuthError> {
        if code.is_empty() {
            return Err(OAuthError::InvalidCode);
        }
        Ok(OAuthToken {
            access_token: format!("static-access-{code}"),
            refresh_token: Some(format!("static-refresh-{code}")),
            expires_at: time::OffsetDateTime::now_utc() + time::Duration::hours(1),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<OAuthToken, OAuthError> {
        if refresh_token.is_empty() {
            return Err(OAuthError::InvalidRefreshToken);
        }
        Ok(OAuthToken {
            access_token: format!("static-access-{}", crate::manager::random_token()),
            refresh_token: Some(refresh_token.to_string()),
            expires_at: time::OffsetDateTime::now_utc() + time::Duration::hours(1),
        })
    }
}
