use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::error::AuthError;
use crate::rbac::Role;
use crate::rotation::KeyRotator;

const DEFAULT_ACCESS_TTL: StdDuration = StdDuration::from_secs(15 * 60);
const DEFAULT_REFRESH_TTL: StdDuration = StdDuration::from_secs(7 * 24 * 60 * 60);

/// Spec §3 JWT claims: user identity/role plus the registered claims
/// `jsonwebtoken` validates (`exp`, `iat`, `nbf`, `iss`, `sub`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub workspace_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// A freshly minted token pair, returned from login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: OffsetDateTime,
    pub refresh_expires_at: OffsetDateTime,
}

struct RefreshEntry {
    user_id: String,
    expires_at: OffsetDateTime,
}

/// Issues and validates access/refresh tokens (spec §4.6). Signing
/// always uses the rotator's current version; verification tries
/// every non-expired version, newest first, stopping at the first
/// success — this is what makes a token survive rotation through its
/// grace period (spec §8 scenario F).
pub struct JwtIssuer {
    rotator: KeyRotator,
    issuer: String,
    access_ttl: StdDuration,
    refresh_ttl: StdDuration,
    refresh_tokens: Mutex<HashMap<String, RefreshEntry>>,
}

impl JwtIssuer {
    pub fn new(rotator: KeyRotator, issuer: impl Into<String>) -> Self {
        Self {
            rotator,
            issuer: issuer.into(),
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            refresh_tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_access_ttl(mut self, ttl: StdDuration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: StdDuration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn rotator(&self) -> &KeyRotator {
        &self.rotator
    }

    /// Mints an access token plus a random refresh token, storing only
    /// the refresh token's SHA-256 hash (spec §4.6).
    pub fn issue(
        &self,
        user_id: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        workspace_id: impl Into<String>,
        permissions: Vec<String>,
    ) -> Result<TokenPair, AuthError> {
        let user_id = user_id.into();
        let now = OffsetDateTime::now_utc();
        let access_expires_at = now + duration_from_std(self.access_ttl);
        let claims = Claims {
            sub: user_id.clone(),
            user_id: user_id.clone(),
            email: email.into(),
            role,
            workspace_id: workspace_id.into(),
            permissions,
            iss: self.issuer.clone(),
            iat: now.unix_timestamp(),
            nbf: now.unix_timestamp(),
            exp: access_expires_at.unix_timestamp(),
        };

        let current = self.rotator.current();
        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(current.secret.as_bytes()),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        let refresh_token = random_url_safe_token(32);
        let refresh_expires_at = now + duration_from_std(self.refresh_ttl);
        self.refresh_tokens.lock().expect("refresh token lock poisoned").insert(
            hash_refresh_token(&refresh_token),
            RefreshEntry { user_id, expires_at: refresh_expires_at },
        );

        Ok(TokenPair { access_token, refresh_token, access_expires_at, refresh_expires_at })
    }

    /// Validates an access token against every non-expired key version,
    /// newest first, returning on first success (spec §4.6/§8).
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.clone()]);

        for version in self.rotator.verifiable() {
            let key = DecodingKey::from_secret(version.secret.as_bytes());
            if let Ok(data) = decode::<Claims>(token, &key, &validation) {
                return Ok(data.claims);
            }
        }
        Err(AuthError::InvalidToken)
    }

    /// Looks up the user id bound to a presented raw refresh token,
    /// rejecting if unknown or expired.
    pub fn resolve_refresh_token(&self, raw_refresh_token: &str) -> Result<String, AuthError> {
        let hash = hash_refresh_token(raw_refresh_token);
        let guard = self.refresh_tokens.lock().expect("refresh token lock poisoned");
        let entry = guard.get(&hash).ok_or(AuthError::InvalidToken)?;
        if entry.expires_at <= OffsetDateTime::now_utc() {
            return Err(AuthError::InvalidToken);
        }
        Ok(entry.user_id.clone())
    }

    pub fn revoke_refresh_token(&self, raw_refresh_token: &str) {
        let hash = hash_refresh_token(raw_refresh_token);
        self.refresh_tokens.lock().expect("refresh token lock poisoned").remove(&hash);
    }
}

fn duration_from_std(std_duration: StdDuration) -> Duration {
    Duration::try_from(std_duration).unwrap_or(Duration::ZERO)
}

fn hash_refresh_token(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn random_url_safe_token(num_bytes: usize) -> String {
    use base64::Engine;
    let mut bytes = vec![0u8; num_bytes];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> JwtIssuer {
        JwtIssuer::new(KeyRotator::new("test-secret-test-secret-32bytes"), "radgate")
    }

    #[test]
    fn round_trips_claims() {
        let issuer = issuer();
        let pair = issuer.issue("u1", "a@b.com", Role::Member, "ws1", vec!["chat".into()]).unwrap();
        let claims = issuer.validate(&pair.access_token).unwrap();
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.role, Role::Member);
    }

    #[test]
    fn survives_rotation_during_grace_period() {
        let issuer = issuer();
        let pair = issuer.issue("u1", "a@b.com", Role::Viewer, "ws1", vec![]).unwrap();
        issuer.rotator().rotate("new-secret-new-secret-32-bytes!!");
        let claims = issuer.validate(&pair.access_token).unwrap();
        assert_eq!(claims.user_id, "u1");
    }

    #[test]
    fn refresh_token_resolves_to_user() {
        let issuer = issuer();
        let pair = issuer.issue("u1", "a@b.com", Role::Viewer, "ws1", vec![]).unwrap();
        assert_eq!(issuer.resolve_refresh_token(&pair.refresh_token).unwrap(), "u1");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let issuer = issuer();
        assert!(issuer.validate("not-a-jwt").is_err());
    }
}
