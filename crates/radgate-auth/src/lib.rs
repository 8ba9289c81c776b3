//! The Auth Envelope (spec §4.6): API-key validation, JWT issuance
//! with a rotating signing-key ring, role-based gating, login-attempt
//! lockout, and CSRF/cookie helpers. Everything that precedes
//! dispatch in the request pipeline lives here.

pub mod api_key;
pub mod cookies;
pub mod csrf;
pub mod error;
pub mod jwt;
pub mod login_attempts;
pub mod rbac;
pub mod rotation;

pub use api_key::{ApiKeyRecord, ApiKeyStatus, ApiKeyStore, hash_token, preview_of};
pub use cookies::{access_token_cookie, expire_cookie, refresh_token_cookie};
pub use csrf::{generate_csrf_token, requires_csrf, verify_csrf};
pub use error::AuthError;
pub use jwt::{Claims, JwtIssuer, TokenPair};
pub use login_attempts::LoginAttemptTracker;
pub use rbac::Role;
pub use rotation::{KeyRotator, KeyVersion};

/// The credential presented on an incoming request, before it is
/// resolved to either an API key or a JWT (spec §6: `Authorization:
/// Bearer`, `x-api-key`, `x-goog-api-key`, or `?key=`).
#[derive(Debug, Clone)]
pub enum PresentedCredential {
    /// Looks like a JWT (`eyJ...`) — validated against the rotator.
    BearerJwt(String),
    /// Anything else — looked up as a raw API key.
    ApiKey(String),
}

impl PresentedCredential {
    /// Classifies a raw token per spec §6: tokens beginning `eyJ` (the
    /// base64 of `{"` for a JWT header) are JWTs, everything else is
    /// an API key.
    pub fn classify(raw: &str) -> Self {
        if raw.starts_with("eyJ") {
            PresentedCredential::BearerJwt(raw.to_string())
        } else {
            PresentedCredential::ApiKey(raw.to_string())
        }
    }
}

/// Extracts the raw credential string from request headers/query per
/// spec §6's accepted-header list, in priority order.
pub fn extract_credential(headers: &http::HeaderMap, query: Option<&str>) -> Option<String> {
    if let Some(auth) = headers.get(http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ").or_else(|| auth.strip_prefix("bearer ")) {
            return Some(token.trim().to_string());
        }
    }
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key.trim().to_string());
    }
    if let Some(key) = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key.trim().to_string());
    }
    if let Some(query) = query {
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("key=") {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_jwt_prefix() {
        assert!(matches!(PresentedCredential::classify("eyJhbGciOi"), PresentedCredential::BearerJwt(_)));
        assert!(matches!(PresentedCredential::classify("rad_demo"), PresentedCredential::ApiKey(_)));
    }

    #[test]
    fn extracts_bearer_then_api_key_then_query() {
        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, "Bearer tok123".parse().unwrap());
        assert_eq!(extract_credential(&headers, None), Some("tok123".to_string()));

        let mut headers = http::HeaderMap::new();
        headers.insert("x-api-key", "rad_demo".parse().unwrap());
        assert_eq!(extract_credential(&headers, None), Some("rad_demo".to_string()));

        let headers = http::HeaderMap::new();
        assert_eq!(extract_credential(&headers, Some("key=rad_query")), Some("rad_query".to_string()));
    }
}
